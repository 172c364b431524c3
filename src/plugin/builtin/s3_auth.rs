//! Origin request signing for S3 buckets (`s3_auth.so`), parent tier only.
//!
//! Credentials never appear on the rule line; they go to a side file passed
//! with `--config`.
//!
//! ```yaml
//! s3_auth:
//!   access_key: AKIA...
//!   secret_key: ...
//!   version: 4
//!   region_map: s3_regions.config
//! ```

use super::{value, with_option};
use crate::core::PluginError;
use crate::plugin::{
    ConfigFileSwitch, LocationRestricted, Plugin, PluginCategory, SharedLibrary, SubConfigFile,
    Weighted,
};
use crate::resolver::{Environment, Location};

const OPTION: &str = "s3_auth";

/// Keys written as `key=value`, in file order
const VALUE_KEYS: &[(&str, &str)] = &[
    ("access_key", "access_key"),
    ("secret_key", "secret_key"),
    ("session_token", "session_token"),
    ("version", "version"),
    ("region_map", "v4-region-map"),
    ("include_headers", "v4-include-headers"),
    ("exclude_headers", "v4-exclude-headers"),
];

const REQUIRED_KEYS: &[&str] = &["access_key", "secret_key"];

#[derive(Debug, Clone, Copy, Default)]
pub struct S3Auth;

impl S3Auth {
    fn settings(value: &serde_yaml::Value) -> Result<String, PluginError> {
        let fields = value::nested_map(OPTION, value)?;
        if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !fields.contains_key(**key)) {
            return Err(PluginError::MissingKey {
                option: OPTION.to_string(),
                key: (*missing).to_string(),
            });
        }

        let mut lines = Vec::new();
        for (key, file_key) in VALUE_KEYS {
            if let Some(entry) = fields.get(*key) {
                let setting = match entry {
                    serde_yaml::Value::Sequence(_) => value::string_list(OPTION, entry)?.join(","),
                    _ => value::scalar(OPTION, entry)?,
                };
                if *key == "version" && setting != "2" && setting != "4" {
                    return Err(PluginError::InvalidValue {
                        option: OPTION.to_string(),
                        expected: "version 2 or 4".to_string(),
                    });
                }
                lines.push(format!("{file_key}={setting}"));
            }
        }
        if let Some(virtual_host) = fields.get("virtual_host")
            && value::flag(OPTION, virtual_host)?
        {
            lines.push("virtual_host".to_string());
        }
        Ok(lines.join("\n"))
    }
}

impl Plugin for S3Auth {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "s3_auth"
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

    fn as_config_switch(&self) -> Option<&dyn ConfigFileSwitch> {
        Some(self)
    }

    fn as_location_restricted(&self) -> Option<&dyn LocationRestricted> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl SharedLibrary for S3Auth {
    fn library(&self) -> &str {
        "s3_auth.so"
    }
}

impl SubConfigFile for S3Auth {
    fn file_name(&self) -> &str {
        "s3_auth.config"
    }

    fn sub_config(&self, env: &Environment) -> Result<String, PluginError> {
        with_option(env, OPTION, Self::settings)
    }
}

impl ConfigFileSwitch for S3Auth {
    fn switch(&self) -> &str {
        "--config"
    }
}

impl LocationRestricted for S3Auth {
    fn locations(&self) -> &[Location] {
        &[Location::Parent]
    }
}

impl Weighted for S3Auth {
    fn weight(&self) -> i32 {
        60
    }
}
