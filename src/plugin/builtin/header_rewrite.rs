//! Header rewriting (`header_rewrite.so`) and the plugins that feed it.
//!
//! All of these share one side file per mapping. The base plugin
//! contributes hand-written rules from the `header_rewrite` option; the
//! members translate their high-level options into rule blocks of the form
//!
//! ```text
//! cond %{SEND_RESPONSE_HDR_HOOK}
//!     set-header X-Receipt "www"
//! ```

use super::{value, with_option};
use crate::core::PluginError;
use crate::plugin::{
    CompoundMember, ContentProducer, Plugin, PluginCategory, RECEIPT, SharedLibrary,
    SubConfigFile, Weighted,
};
use crate::resolver::Environment;

const FAMILY: &str = "header_rewrite";

const SEND_RESPONSE_HOOK: &str = "SEND_RESPONSE_HDR_HOOK";
const READ_RESPONSE_HOOK: &str = "READ_RESPONSE_HDR_HOOK";

/// One `cond` line followed by indented operators; nothing for no operators.
fn hook_block(hook: &str, operators: &[String]) -> String {
    if operators.is_empty() {
        return String::new();
    }
    let mut block = format!("cond %{{{hook}}}");
    for operator in operators {
        block.push_str("\n    ");
        block.push_str(operator);
    }
    block
}

fn header_name(option: &str, name: &str) -> Result<String, PluginError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(name.to_string())
    } else {
        Err(PluginError::InvalidValue {
            option: option.to_string(),
            expected: format!("header names made of letters, digits, '-' or '_', not '{name}'"),
        })
    }
}

fn header_value(option: &str, text: &str) -> Result<String, PluginError> {
    if text.contains(['"', '\n', '\r']) {
        return Err(PluginError::InvalidValue {
            option: option.to_string(),
            expected: "header values without quotes or line breaks".to_string(),
        });
    }
    Ok(format!("\"{text}\""))
}

/// Family base: raw rules plus the shared side file
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderRewrite;

impl Plugin for HeaderRewrite {
    fn category(&self) -> PluginCategory {
        PluginCategory::Compound
    }

    fn plugin_type(&self) -> &'static str {
        FAMILY
    }

    fn config_names(&self) -> &'static [&'static str] {
        &[FAMILY]
    }

    fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
        Some(self)
    }

    fn as_sub_config(&self) -> Option<&dyn SubConfigFile> {
        Some(self)
    }

    fn as_compound_member(&self) -> Option<&dyn CompoundMember> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl SharedLibrary for HeaderRewrite {
    fn library(&self) -> &str {
        "header_rewrite.so"
    }
}

impl SubConfigFile for HeaderRewrite {
    fn file_name(&self) -> &str {
        "header_rewrite.config"
    }

    /// Rules are taken as written, either a list of lines or one text block
    fn sub_config(&self, env: &Environment) -> Result<String, PluginError> {
        with_option(env, FAMILY, |rules| {
            let lines = match rules {
                serde_yaml::Value::Sequence(_) => value::string_list(FAMILY, rules)?,
                other => vec![value::scalar(FAMILY, other)?],
            };
            Ok(lines
                .iter()
                .map(|line| line.trim_end())
                .collect::<Vec<_>>()
                .join("\n"))
        })
    }
}

impl CompoundMember for HeaderRewrite {
    fn family(&self) -> &'static str {
        FAMILY
    }
}

impl Weighted for HeaderRewrite {
    fn weight(&self) -> i32 {
        10
    }
}

/// Declares a content-producing member of the header rewrite family.
macro_rules! header_member {
    ($(#[$meta:meta])* $name:ident, $tag:expr, $option:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Plugin for $name {
            fn category(&self) -> PluginCategory {
                PluginCategory::Compound
            }

            fn plugin_type(&self) -> &'static str {
                $tag
            }

            fn config_names(&self) -> &'static [&'static str] {
                &[$option]
            }

            fn as_content(&self) -> Option<&dyn ContentProducer> {
                Some(self)
            }

            fn as_compound_member(&self) -> Option<&dyn CompoundMember> {
                Some(self)
            }
        }

        impl CompoundMember for $name {
            fn family(&self) -> &'static str {
                FAMILY
            }
        }
    };
}

header_member!(
    /// Stamps every response with the property that served it
    Receipt,
    RECEIPT,
    "receipt"
);

impl ContentProducer for Receipt {
    fn content(&self, env: &Environment) -> Result<String, PluginError> {
        let enabled = with_option(env, "receipt", |v| value::flag("receipt", v))?;
        if !enabled {
            return Ok(String::new());
        }
        Ok(hook_block(
            SEND_RESPONSE_HOOK,
            &[format!("set-header X-Receipt {}", header_value("receipt", &env.property)?)],
        ))
    }
}

header_member!(
    /// Adds response headers, one `set-header` per entry sorted by name
    SetHeaders,
    "set_headers",
    "set_headers"
);

impl ContentProducer for SetHeaders {
    fn content(&self, env: &Environment) -> Result<String, PluginError> {
        let option = "set_headers";
        let headers = with_option(env, option, |v| value::string_map(option, v))?;
        let operators = headers
            .iter()
            .map(|(name, text)| {
                Ok(format!(
                    "set-header {} {}",
                    header_name(option, name)?,
                    header_value(option, text)?
                ))
            })
            .collect::<Result<Vec<_>, PluginError>>()?;
        Ok(hook_block(SEND_RESPONSE_HOOK, &operators))
    }
}

header_member!(
    /// Strips response headers
    RemoveHeaders,
    "remove_headers",
    "remove_headers"
);

impl ContentProducer for RemoveHeaders {
    fn content(&self, env: &Environment) -> Result<String, PluginError> {
        let option = "remove_headers";
        let names = with_option(env, option, |v| value::string_list(option, v))?;
        let operators = names
            .iter()
            .map(|name| Ok(format!("rm-header {}", header_name(option, name)?)))
            .collect::<Result<Vec<_>, PluginError>>()?;
        Ok(hook_block(SEND_RESPONSE_HOOK, &operators))
    }
}

header_member!(
    /// Overrides the origin's cache lifetime, in seconds
    CacheTtl,
    "cache_ttl",
    "cache_ttl"
);

impl ContentProducer for CacheTtl {
    fn content(&self, env: &Environment) -> Result<String, PluginError> {
        let option = "cache_ttl";
        let Some(ttl) = env.option(option) else {
            return Ok(String::new());
        };
        let seconds = value::unsigned(option, ttl)?;
        Ok(hook_block(
            READ_RESPONSE_HOOK,
            &[format!("set-header Cache-Control \"max-age={seconds}\"")],
        ))
    }
}
