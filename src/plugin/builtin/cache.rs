//! Cache behavior plugins: range request caching and cache promotion.

use std::collections::BTreeMap;

use super::{long_flags, value, with_option};
use crate::core::PluginError;
use crate::plugin::{
    DEFAULT_ROLE, LocationRestricted, ParameterProducer, Plugin, PluginCategory,
    RoleParameterProducer, SharedLibrary, Weighted,
};
use crate::resolver::{Environment, Location};

/// Caches range requests as separate objects (`cache_range_requests.so`).
///
/// Only meaningful on the parent tier. `true` keys the cache on the
/// pristine URL; a map passes its settings as flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheRange;

const RANGE_OPTION: &str = "cache_range_requests";

impl Plugin for CacheRange {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "cache_range"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &[RANGE_OPTION]
    }

    fn as_parameters(&self) -> Option<&dyn ParameterProducer> {
        Some(self)
    }

    fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
        Some(self)
    }

    fn as_location_restricted(&self) -> Option<&dyn LocationRestricted> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl ParameterProducer for CacheRange {
    fn parameters(&self, env: &Environment) -> Result<Vec<String>, PluginError> {
        with_option(env, RANGE_OPTION, |value| match value {
            serde_yaml::Value::Bool(true) => Ok(vec!["--ps-cachekey".to_string()]),
            serde_yaml::Value::Bool(false) => Ok(Vec::new()),
            other => long_flags(RANGE_OPTION, other),
        })
    }
}

impl SharedLibrary for CacheRange {
    fn library(&self) -> &str {
        "cache_range_requests.so"
    }
}

impl LocationRestricted for CacheRange {
    fn locations(&self) -> &[Location] {
        &[Location::Parent]
    }
}

impl Weighted for CacheRange {
    fn weight(&self) -> i32 {
        40
    }
}

/// Admits objects to cache only after repeated requests (`cache_promote.so`).
///
/// Settings under `roles` override the defaults on hosts with that role:
///
/// ```yaml
/// cache_promote:
///   policy: lru
///   hits: 10
///   roles:
///     roles_edge_small:
///       hits: 20
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePromote;

const PROMOTE_OPTION: &str = "cache_promote";

impl Plugin for CachePromote {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "cache_promote"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &[PROMOTE_OPTION]
    }

    fn as_role_parameters(&self) -> Option<&dyn RoleParameterProducer> {
        Some(self)
    }

    fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl RoleParameterProducer for CachePromote {
    fn role_parameters(
        &self,
        env: &Environment,
    ) -> Result<BTreeMap<String, Vec<String>>, PluginError> {
        with_option(env, PROMOTE_OPTION, |value| {
            let mut settings = value.clone();
            let roles = match settings.as_mapping_mut() {
                Some(map) => map.remove("roles"),
                None => None,
            };

            let mut out = BTreeMap::new();
            let defaults = long_flags(PROMOTE_OPTION, &settings)?;
            if !defaults.is_empty() {
                out.insert(DEFAULT_ROLE.to_string(), defaults);
            }

            if let Some(roles) = roles {
                for (role, overrides) in value::nested_map(PROMOTE_OPTION, &roles)? {
                    out.insert(role, long_flags(PROMOTE_OPTION, overrides)?);
                }
            }
            Ok(out)
        })
    }
}

impl SharedLibrary for CachePromote {
    fn library(&self) -> &str {
        "cache_promote.so"
    }
}

impl Weighted for CachePromote {
    fn weight(&self) -> i32 {
        50
    }
}
