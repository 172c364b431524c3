//! Built-in plugins
//!
//! Each plugin owns one declarative feature and is opaque to the engine.
//! [`all`] is the single constructor list the default registry is built
//! from; adding a plugin means adding it here.
//!
//! | Type | Category | Options | Weight |
//! |---|---|---|---|
//! | `allow_ip` | action | `allow_ip`, `ip_allow` | 120 |
//! | `deny_ip` | action | `deny_ip` | 120 |
//! | `http_methods` | general | `allow_methods` | 110 |
//! | `compress` | general | `compress` | 30 |
//! | `cache_range` | general | `cache_range_requests` | 40 |
//! | `cache_promote` | general | `cache_promote` | 50 |
//! | `conf_remap` | general | `overrides` | 15 |
//! | `regex_remap` | general | `regex_remap` | 150 |
//! | `lua` | general | `lua_script` | 160 |
//! | `s3_auth` | general | `s3_auth` | 60 |
//! | `xdebug` | general | `debug_headers` | 170 |
//! | `header_rewrite` | compound | `header_rewrite`, `receipt`, `set_headers`, `remove_headers`, `cache_ttl` | 10 |
//! | `cachekey` | compound | `cachekey`, `cache_key_params`, `cache_key_headers` | 20 |

mod access;
mod cache;
mod cachekey;
mod compress;
mod conf_remap;
mod header_rewrite;
mod lua;
mod regex_remap;
mod s3_auth;
mod xdebug;

use std::sync::Arc;

use super::Plugin;
use super::value;
use crate::core::PluginError;
use crate::resolver::Environment;

pub use access::{AllowIp, DenyIp, HttpMethods};
pub use cache::{CachePromote, CacheRange};
pub use cachekey::{CacheKey, CacheKeyHeaders, CacheKeyParams};
pub use compress::Compress;
pub use conf_remap::ConfRemap;
pub use header_rewrite::{CacheTtl, HeaderRewrite, Receipt, RemoveHeaders, SetHeaders};
pub use lua::Lua;
pub use regex_remap::RegexRemap;
pub use s3_auth::S3Auth;
pub use xdebug::XDebug;

/// Every built-in plugin, in registration order.
///
/// Compound family bases are listed before their members.
#[must_use]
pub fn all() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(AllowIp),
        Arc::new(DenyIp),
        Arc::new(HttpMethods),
        Arc::new(Compress),
        Arc::new(CacheRange),
        Arc::new(CachePromote),
        Arc::new(ConfRemap),
        Arc::new(RegexRemap),
        Arc::new(Lua),
        Arc::new(S3Auth),
        Arc::new(XDebug),
        Arc::new(HeaderRewrite),
        Arc::new(Receipt),
        Arc::new(SetHeaders),
        Arc::new(RemoveHeaders),
        Arc::new(CacheTtl),
        Arc::new(CacheKey),
        Arc::new(CacheKeyParams),
        Arc::new(CacheKeyHeaders),
    ]
}

/// `--flag=value` tokens from a map option, keys sorted, `_` spelled `-`.
///
/// `true` values become a bare `--flag`; `false` values are dropped.
fn long_flags(option: &str, value: &serde_yaml::Value) -> Result<Vec<String>, PluginError> {
    let map = value::nested_map(option, value)?;
    let mut tokens = Vec::with_capacity(map.len());
    for (key, entry) in map {
        let flag = key.replace('_', "-");
        match entry {
            serde_yaml::Value::Bool(true) => tokens.push(format!("--{flag}")),
            serde_yaml::Value::Bool(false) => {}
            other => tokens.push(format!("--{flag}={}", value::scalar(option, other)?)),
        }
    }
    Ok(tokens)
}

/// Run `f` on the plugin's option, or produce the empty value when unset.
fn with_option<T: Default>(
    env: &Environment,
    option: &str,
    f: impl FnOnce(&serde_yaml::Value) -> Result<T, PluginError>,
) -> Result<T, PluginError> {
    match env.option(option) {
        Some(serde_yaml::Value::Null) | None => Ok(T::default()),
        Some(value) => f(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{PluginCategory, Registry, family_of, weight_of};

    #[test]
    fn test_type_tags_are_unique() {
        let plugins = all();
        let mut tags: Vec<_> = plugins.iter().map(|p| p.plugin_type()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), plugins.len());
    }

    #[test]
    fn test_every_family_has_a_base() {
        let registry = Registry::builtin();
        for plugin in all() {
            if plugin.category() == PluginCategory::Compound {
                let family = family_of(plugin.as_ref());
                assert!(
                    registry.plugin(family).is_some(),
                    "family '{family}' has no base plugin"
                );
            }
        }
    }

    #[test]
    fn test_declared_weights() {
        let registry = Registry::builtin();
        let weight = |t: &str| weight_of(registry.plugin(t).unwrap().as_ref());
        assert_eq!(weight("allow_ip"), 120);
        assert_eq!(weight("conf_remap"), 15);
        assert_eq!(weight("regex_remap"), 150);
        assert_eq!(weight("header_rewrite"), 10);
        assert_eq!(weight("receipt"), crate::plugin::DEFAULT_WEIGHT);
    }

    #[test]
    fn test_long_flags() {
        let value: serde_yaml::Value =
            serde_yaml::from_str("{static_prefix: www, remove_all_params: true, off: false}")
                .unwrap();
        assert_eq!(
            long_flags("cachekey", &value).unwrap(),
            vec!["--remove-all-params", "--static-prefix=www"]
        );
    }
}
