//! Cache key shaping (`cachekey.so`).
//!
//! The base takes plugin flags as a map; the members translate list options
//! into include flags. Everything ends up as parameters on one rule line.

use super::{long_flags, value, with_option};
use crate::core::PluginError;
use crate::plugin::{
    CompoundMember, ParameterProducer, Plugin, PluginCategory, SharedLibrary, Weighted,
};
use crate::resolver::Environment;

const FAMILY: &str = "cachekey";

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheKey;

impl Plugin for CacheKey {
    fn category(&self) -> PluginCategory {
        PluginCategory::Compound
    }

    fn plugin_type(&self) -> &'static str {
        FAMILY
    }

    fn config_names(&self) -> &'static [&'static str] {
        &[FAMILY]
    }

    fn as_parameters(&self) -> Option<&dyn ParameterProducer> {
        Some(self)
    }

    fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
        Some(self)
    }

    fn as_compound_member(&self) -> Option<&dyn CompoundMember> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl ParameterProducer for CacheKey {
    fn parameters(&self, env: &Environment) -> Result<Vec<String>, PluginError> {
        with_option(env, FAMILY, |v| long_flags(FAMILY, v))
    }
}

impl SharedLibrary for CacheKey {
    fn library(&self) -> &str {
        "cachekey.so"
    }
}

impl CompoundMember for CacheKey {
    fn family(&self) -> &'static str {
        FAMILY
    }
}

impl Weighted for CacheKey {
    fn weight(&self) -> i32 {
        20
    }
}

/// `--<flag>=a,b` from a list option; nothing for an empty list
fn include_flag(env: &Environment, option: &str, flag: &str) -> Result<Vec<String>, PluginError> {
    let entries = with_option(env, option, |v| value::string_list(option, v))?;
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![format!("--{flag}={}", entries.join(","))])
}

/// Query parameters that take part in the cache key
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheKeyParams;

impl Plugin for CacheKeyParams {
    fn category(&self) -> PluginCategory {
        PluginCategory::Compound
    }

    fn plugin_type(&self) -> &'static str {
        "cachekey_params"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &["cache_key_params"]
    }

    fn as_parameters(&self) -> Option<&dyn ParameterProducer> {
        Some(self)
    }

    fn as_compound_member(&self) -> Option<&dyn CompoundMember> {
        Some(self)
    }
}

impl ParameterProducer for CacheKeyParams {
    fn parameters(&self, env: &Environment) -> Result<Vec<String>, PluginError> {
        include_flag(env, "cache_key_params", "include-params")
    }
}

impl CompoundMember for CacheKeyParams {
    fn family(&self) -> &'static str {
        FAMILY
    }
}

/// Request headers that take part in the cache key
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheKeyHeaders;

impl Plugin for CacheKeyHeaders {
    fn category(&self) -> PluginCategory {
        PluginCategory::Compound
    }

    fn plugin_type(&self) -> &'static str {
        "cachekey_headers"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &["cache_key_headers"]
    }

    fn as_parameters(&self) -> Option<&dyn ParameterProducer> {
        Some(self)
    }

    fn as_compound_member(&self) -> Option<&dyn CompoundMember> {
        Some(self)
    }
}

impl ParameterProducer for CacheKeyHeaders {
    fn parameters(&self, env: &Environment) -> Result<Vec<String>, PluginError> {
        include_flag(env, "cache_key_headers", "include-headers")
    }
}

impl CompoundMember for CacheKeyHeaders {
    fn family(&self) -> &'static str {
        FAMILY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::OptionSet;

    fn env(yaml: &str) -> Environment {
        let options: OptionSet = serde_yaml::from_str(yaml).unwrap();
        Environment::new("www", options)
    }

    #[test]
    fn test_include_flags() {
        let env = env("{cache_key_params: [id, lang], cache_key_headers: []}");
        assert_eq!(
            CacheKeyParams.parameters(&env).unwrap(),
            vec!["--include-params=id,lang"]
        );
        assert!(CacheKeyHeaders.parameters(&env).unwrap().is_empty());
    }

    #[test]
    fn test_base_flags() {
        assert_eq!(
            CacheKey
                .parameters(&env("{cachekey: {static_prefix: www}}"))
                .unwrap(),
            vec!["--static-prefix=www"]
        );
    }
}
