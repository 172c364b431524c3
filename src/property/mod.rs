//! Property specifications
//!
//! A property is one YAML document describing a site: property-wide options
//! and the mappings (source aliases to origin) they apply to.
//!
//! ```yaml
//! name: www
//! options:
//!   compress: true
//!   receipt: true
//! mappings:
//!   - from: [www.example.com, example.com]
//!     to: http://origin.example.com
//!     schemes: [http, https]
//!     options:
//!       parent_child: true
//!       cache_ttl: 300
//! ```
//!
//! Mapping options overlay the property options key by key. Expansion into
//! per-location targets lives in [`expand`].

pub mod expand;

pub use expand::{Target, expand};

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::RemapError;
use crate::resolver::OptionSet;

/// Schemes a mapping may use, in canonical order
pub const SCHEMES: &[&str] = &["http", "https", "ws", "wss"];

fn default_schemes() -> Vec<String> {
    vec!["http".to_string()]
}

/// One YAML property document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySpec {
    /// Property name; prefixes every side file
    pub name: String,

    /// Options applied to every mapping
    #[serde(default)]
    pub options: OptionSet,

    /// Source-to-origin mappings, in file order
    #[serde(default)]
    pub mappings: Vec<MappingSpec>,
}

/// One source-to-origin mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingSpec {
    /// Source host aliases
    pub from: Vec<String>,

    /// Origin URL
    pub to: String,

    /// Schemes the aliases are served on
    #[serde(default = "default_schemes")]
    pub schemes: Vec<String>,

    /// Apply every option regardless of plugin location restrictions
    #[serde(default)]
    pub explicit: bool,

    /// Overrides of the property options for this mapping
    #[serde(default)]
    pub options: OptionSet,
}

impl MappingSpec {
    /// Property options overlaid with this mapping's options
    #[must_use]
    pub fn merged_options(&self, property: &OptionSet) -> OptionSet {
        let mut merged = property.clone();
        merged.extend(self.options.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

impl PropertySpec {
    /// Parse a property document. `file` only labels errors.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::PropertyParse`] for invalid YAML, unknown
    /// fields or a name that cannot prefix file names.
    pub fn from_yaml(text: &str, file: &str) -> Result<Self, RemapError> {
        let spec: Self = serde_yaml::from_str(text).map_err(|e| RemapError::PropertyParse {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

        let valid_name = !spec.name.is_empty()
            && spec
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        if !valid_name {
            return Err(RemapError::PropertyParse {
                file: file.to_string(),
                reason: format!(
                    "property name '{}' must be non-empty and use only letters, digits, '-', '_' or '.'",
                    spec.name
                ),
            });
        }
        Ok(spec)
    }

    /// Read and parse a property file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read property file: {}", path.display()))?;
        Ok(Self::from_yaml(&content, &path.display().to_string())?)
    }
}
