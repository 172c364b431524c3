//! Per-mapping overrides of proxy records (`conf_remap.so`).

use super::{value, with_option};
use crate::core::PluginError;
use crate::plugin::{ParameterProducer, Plugin, PluginCategory, SharedLibrary, Weighted};
use crate::resolver::Environment;

const OPTION: &str = "overrides";
const RECORD_PREFIX: &str = "proxy.config.";

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfRemap;

impl Plugin for ConfRemap {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "conf_remap"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &[OPTION]
    }

    fn as_parameters(&self) -> Option<&dyn ParameterProducer> {
        Some(self)
    }

    fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl ParameterProducer for ConfRemap {
    /// `<record>=<value>` per override, records sorted
    fn parameters(&self, env: &Environment) -> Result<Vec<String>, PluginError> {
        let overrides = with_option(env, OPTION, |v| value::string_map(OPTION, v))?;
        overrides
            .into_iter()
            .map(|(record, setting)| {
                if !record.starts_with(RECORD_PREFIX) || record.contains(char::is_whitespace) {
                    return Err(PluginError::InvalidValue {
                        option: OPTION.to_string(),
                        expected: format!("record names starting with '{RECORD_PREFIX}'"),
                    });
                }
                Ok(format!("{record}={setting}"))
            })
            .collect()
    }
}

impl SharedLibrary for ConfRemap {
    fn library(&self) -> &str {
        "conf_remap.so"
    }
}

impl Weighted for ConfRemap {
    fn weight(&self) -> i32 {
        15
    }
}
