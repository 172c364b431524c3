//! Debug response headers (`xdebug.so`), only on hosts with the debug role.

use super::{value, with_option};
use crate::core::PluginError;
use crate::plugin::{
    ParameterProducer, Plugin, PluginCategory, RoleGated, SharedLibrary, Weighted,
};
use crate::resolver::Environment;

const OPTION: &str = "debug_headers";

/// Host role that receives debug headers
pub const DEBUG_ROLE: &str = "roles_debug";

const HEADERS: &[&str] = &[
    "all",
    "diags",
    "probe",
    "via",
    "x-cache",
    "x-cache-info",
    "x-cache-key",
    "x-effective-url",
    "x-milestones",
    "x-remap",
    "x-transaction-id",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct XDebug;

impl Plugin for XDebug {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "xdebug"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &[OPTION]
    }

    fn as_parameters(&self) -> Option<&dyn ParameterProducer> {
        Some(self)
    }

    fn as_role_gated(&self) -> Option<&dyn RoleGated> {
        Some(self)
    }

    fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl ParameterProducer for XDebug {
    fn parameters(&self, env: &Environment) -> Result<Vec<String>, PluginError> {
        let headers = with_option(env, OPTION, |v| value::string_list(OPTION, v))?;
        headers
            .into_iter()
            .map(|header| {
                let header = header.to_ascii_lowercase();
                if HEADERS.contains(&header.as_str()) {
                    Ok(format!("--enable={header}"))
                } else {
                    Err(PluginError::InvalidValue {
                        option: OPTION.to_string(),
                        expected: format!("debug headers from {HEADERS:?}, not '{header}'"),
                    })
                }
            })
            .collect()
    }
}

impl RoleGated for XDebug {
    fn role(&self) -> &str {
        DEBUG_ROLE
    }
}

impl SharedLibrary for XDebug {
    fn library(&self) -> &str {
        "xdebug.so"
    }
}

impl Weighted for XDebug {
    fn weight(&self) -> i32 {
        170
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{OptionSet, render};

    fn env(yaml: &str) -> Environment {
        let options: OptionSet = serde_yaml::from_str(yaml).unwrap();
        Environment::new("www", options)
    }

    #[test]
    fn test_guarded_by_debug_role() {
        let rendered = render(&XDebug, &env("{debug_headers: [X-Cache, x-cache-key]}")).unwrap();
        assert_eq!(
            rendered.content,
            "{% if \"roles_debug\" in roles %}\n\
             @plugin=xdebug.so @pparam=--enable=x-cache @pparam=--enable=x-cache-key\n\
             {% else %}\n\
             {% endif %}"
        );
    }

    #[test]
    fn test_unknown_header_rejected() {
        assert!(
            XDebug
                .parameters(&env("{debug_headers: [x-secret]}"))
                .is_err()
        );
    }
}
