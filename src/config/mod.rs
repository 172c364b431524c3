//! Configuration management for remapgen
//!
//! The compiler reads one optional TOML file. Every field has a default, so
//! running without any configuration is valid.
//!
//! ```toml
//! # remapgen.toml
//! output_dir = "build/remap"
//! remap_file = "remap.config"
//! parent_remap_file = "parent_remap.config"
//!
//! # Plugins replaced by no-ops; their options are still accepted
//! disabled_plugins = ["xdebug"]
//!
//! # Host roles used to render role blocks when compiling for one host
//! roles = ["roles_debug"]
//! ```
//!
//! # Lookup Order
//!
//! 1. `--config <path>` (or the `REMAPGEN_CONFIG` environment variable)
//! 2. `./remapgen.toml`
//! 3. `<config dir>/remapgen/config.toml` (`~/.config` on Linux)
//! 4. Built-in defaults
//!
//! An explicitly named file must exist; the implicit locations are skipped
//! when missing.

mod parser;

pub use parser::parse_config;

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::RemapError;
use crate::plugin::Registry;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "remapgen.toml";

/// Compiler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Directory that receives the remap files and side files
    pub output_dir: PathBuf,

    /// Plugin type tags to replace with no-ops
    pub disabled_plugins: Vec<String>,

    /// Host roles for deployment-time rendering; empty keeps role blocks as-is
    pub roles: Vec<String>,

    /// Remap file for child and location-agnostic mappings
    pub remap_file: String,

    /// Remap file for parent mappings
    pub parent_remap_file: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
            disabled_plugins: Vec::new(),
            roles: Vec::new(),
            remap_file: "remap.config".to_string(),
            parent_remap_file: "parent_remap.config".to_string(),
        }
    }
}

impl CompilerConfig {
    /// Load the configuration following the lookup order.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` does not exist, or if the file found
    /// cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(RemapError::ConfigError {
                    message: format!("config file not found: {}", path.display()),
                }
                .into());
            }
            return Self::load_from(path);
        }

        let candidates = [Some(PathBuf::from(LOCAL_CONFIG_FILE)), Self::user_path()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Self::load_from(&path);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load from one file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        parse_config(path)
    }

    /// Per-user configuration path, when the platform has a config directory
    #[must_use]
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("remapgen").join("config.toml"))
    }

    /// Built-in registry with this configuration's plugins disabled.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::ConfigError`] naming every disabled type that
    /// is not registered.
    pub fn registry(&self) -> Result<Registry, RemapError> {
        let mut registry = Registry::builtin();
        let unknown: Vec<&str> = self
            .disabled_plugins
            .iter()
            .filter(|plugin_type| !registry.disable(plugin_type))
            .map(String::as_str)
            .collect();

        if unknown.is_empty() {
            Ok(registry)
        } else {
            Err(RemapError::ConfigError {
                message: format!(
                    "unknown plugin type(s) in disabled_plugins: {}",
                    unknown.join(", ")
                ),
            })
        }
    }
}
