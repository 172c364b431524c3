//! Inline Lua scripts (`tslua.so`).

use super::{value, with_option};
use crate::core::PluginError;
use crate::plugin::{Plugin, PluginCategory, SharedLibrary, SubConfigFile, Weighted};
use crate::resolver::Environment;

const OPTION: &str = "lua_script";

/// Writes the script verbatim to `<property>_script.lua`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lua;

impl Plugin for Lua {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "lua"
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

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl SharedLibrary for Lua {
    fn library(&self) -> &str {
        "tslua.so"
    }
}

impl SubConfigFile for Lua {
    fn file_name(&self) -> &str {
        "script.lua"
    }

    fn sub_config(&self, env: &Environment) -> Result<String, PluginError> {
        let script = with_option(env, OPTION, |v| value::scalar(OPTION, v))?;
        Ok(script.trim_end().to_string())
    }
}

impl Weighted for Lua {
    fn weight(&self) -> i32 {
        160
    }
}
