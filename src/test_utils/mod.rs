//! Shared helpers for unit and integration tests.
//!
//! Available to this crate's own tests and, through the `test-utils`
//! feature, to the `tests/` targets.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::resolver::{Environment, Location, OptionSet};

static INIT_LOGGING: Once = Once::new();

/// Install a test log subscriber once per process.
///
/// `level` wins over `RUST_LOG`; with neither, tests stay silent.
///
/// ```bash
/// RUST_LOG=remapgen_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Options parsed from a YAML mapping, e.g. `"{allow_ip: [10.0.0.1]}"`
///
/// # Panics
///
/// Panics if `yaml` is not a mapping of options.
#[must_use]
pub fn options(yaml: &str) -> OptionSet {
    serde_yaml::from_str(yaml).expect("test options must be a YAML mapping")
}

/// Environment for property `www` at `location`
#[must_use]
pub fn environment(yaml: &str, location: Location) -> Environment {
    Environment::new("www", options(yaml)).with_location(location)
}

/// Property document with a single mapping of `alias` to an origin
#[must_use]
pub fn property_yaml(name: &str, alias: &str, options: &str) -> String {
    format!(
        "name: {name}\n\
         mappings:\n\
         \x20 - from: [{alias}]\n\
         \x20   to: http://origin.example.com\n\
         \x20   options: {options}\n"
    )
}

/// Write `yaml` to `dir/file_name` and return the path
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_property(dir: &Path, file_name: &str, yaml: &str) -> PathBuf {
    let path = dir.join(file_name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create property directory");
    }
    std::fs::write(&path, yaml).expect("write property file");
    path
}
