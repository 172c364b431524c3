//! Response compression (`compress.so`), edge tier only.
//!
//! `compress: true` enables the plugin with its defaults; a map selects
//! individual settings:
//!
//! ```yaml
//! compress:
//!   algorithms: [gzip, br]
//!   content_types: [text/*, application/json]
//!   minimum_content_length: 1024
//!   remove_accept_encoding: true
//! ```

use super::{value, with_option};
use crate::core::PluginError;
use crate::plugin::{
    LocationRestricted, Plugin, PluginCategory, SharedLibrary, SubConfigFile, Weighted,
};
use crate::resolver::{Environment, Location};

const OPTION: &str = "compress";

const ALGORITHMS: &[&str] = &["gzip", "br", "deflate"];

#[derive(Debug, Clone, Copy, Default)]
pub struct Compress;

impl Compress {
    fn settings(value: &serde_yaml::Value) -> Result<String, PluginError> {
        if let serde_yaml::Value::Bool(enabled) = value {
            return Ok(if *enabled {
                "enabled true\ncache true".to_string()
            } else {
                String::new()
            });
        }

        let map = value::nested_map(OPTION, value)?;
        let mut lines = vec!["enabled true".to_string(), "cache true".to_string()];
        for (key, entry) in map {
            match key.as_str() {
                "algorithms" => {
                    let algorithms = value::string_list(OPTION, entry)?;
                    if let Some(unknown) = algorithms
                        .iter()
                        .find(|a| !ALGORITHMS.contains(&a.as_str()))
                    {
                        return Err(PluginError::InvalidValue {
                            option: OPTION.to_string(),
                            expected: format!("algorithms from {ALGORITHMS:?}, not '{unknown}'"),
                        });
                    }
                    lines.push(format!("supported-algorithms {}", algorithms.join(",")));
                }
                "content_types" => {
                    for content_type in value::string_list(OPTION, entry)? {
                        lines.push(format!("compressible-content-type {content_type}"));
                    }
                }
                "minimum_content_length" => {
                    lines.push(format!(
                        "minimum-content-length {}",
                        value::unsigned(OPTION, entry)?
                    ));
                }
                "remove_accept_encoding" => {
                    lines.push(format!(
                        "remove-accept-encoding {}",
                        value::flag(OPTION, entry)?
                    ));
                }
                _ => {
                    return Err(PluginError::InvalidValue {
                        option: OPTION.to_string(),
                        expected: format!("a known setting, not '{key}'"),
                    });
                }
            }
        }
        Ok(lines.join("\n"))
    }
}

impl Plugin for Compress {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "compress"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &[OPTION]
    }

    fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
        Some(self)
    }

    fn as_sub_config(&self) -> Option<&dyn SubConfigFile> {
        Some(self)
    }

    fn as_location_restricted(&self) -> Option<&dyn LocationRestricted> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl SharedLibrary for Compress {
    fn library(&self) -> &str {
        "compress.so"
    }
}

impl SubConfigFile for Compress {
    fn file_name(&self) -> &str {
        "compress.config"
    }

    fn sub_config(&self, env: &Environment) -> Result<String, PluginError> {
        with_option(env, OPTION, Self::settings)
    }
}

impl LocationRestricted for Compress {
    fn locations(&self) -> &[Location] {
        &[Location::Child]
    }
}

impl Weighted for Compress {
    fn weight(&self) -> i32 {
        30
    }
}
