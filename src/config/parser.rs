//! Generic configuration parsing utilities.
//!
//! Reads a TOML file into any `DeserializeOwned` type. Errors carry the
//! file path so the CLI can show which file failed and why:
//!
//! ```text
//! Failed to parse config file: /path/to/remapgen.toml
//! Caused by:
//!     invalid type: string "yes", expected a sequence
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML configuration file into the specified type.
///
/// # Examples
///
/// ```rust,no_run
/// use remapgen_cli::config::{CompilerConfig, parse_config};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config: CompilerConfig = parse_config(Path::new("remapgen.toml"))?;
/// println!("Writing to {}", config.output_dir.display());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content does not
/// deserialize into `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
