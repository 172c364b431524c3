//! Regex-based URL rewriting (`regex_remap.so`).
//!
//! Every rule is validated before it is written; the proxy would otherwise
//! only report a bad pattern when it loads the file.
//!
//! ```yaml
//! regex_remap:
//!   - match: ^/images/(.*)
//!     to: http://img.example.com/$1
//!   - match: ^/old/
//!     to: http://www.example.com/new/
//!     status: 301
//!   - match: ^/slow/(?!cached/)(.*)
//!     to: http://origin.example.com/$1
//!     connect_timeout: 2000
//! ```
//!
//! Patterns are checked with `fancy-regex`, which accepts the PCRE
//! constructs the proxy supports (look-around, backreferences).

use fancy_regex::Regex;

use super::{value, with_option};
use crate::core::PluginError;
use crate::plugin::{Plugin, PluginCategory, SharedLibrary, SubConfigFile, Weighted};
use crate::resolver::Environment;

const OPTION: &str = "regex_remap";

/// Per-rule overrides, in the order they are written after the target.
/// Timeouts are in milliseconds.
const RULE_OPTIONS: &[&str] = &[
    "status",
    "active_timeout",
    "no_activity_timeout",
    "connect_timeout",
    "dns_timeout",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexRemap;

fn invalid(expected: String) -> PluginError {
    PluginError::InvalidValue {
        option: OPTION.to_string(),
        expected,
    }
}

/// The proxy splits rule lines on whitespace, so no field may contain any.
fn token(key: &str, text: String) -> Result<String, PluginError> {
    if text.is_empty() || text.contains(char::is_whitespace) {
        return Err(invalid(format!("a non-empty '{key}' without whitespace")));
    }
    Ok(text)
}

fn rule_option(key: &str, value: &serde_yaml::Value) -> Result<u64, PluginError> {
    let number = value::unsigned(OPTION, value)
        .map_err(|_| invalid(format!("a non-negative integer for '{key}'")))?;
    if key == "status" && !(100..=599).contains(&number) {
        return Err(invalid(format!("an HTTP status code for 'status', not {number}")));
    }
    Ok(number)
}

/// `<pattern> <target> [@key=value ...]`
fn rule_line(entry: &serde_yaml::Value) -> Result<String, PluginError> {
    let fields = value::nested_map(OPTION, entry)?;
    let known = |key: &str| matches!(key, "match" | "to") || RULE_OPTIONS.contains(&key);
    if let Some(unknown) = fields.keys().find(|key| !known(key.as_str())) {
        return Err(invalid(format!(
            "rule keys match, to, {}; not '{unknown}'",
            RULE_OPTIONS.join(", ")
        )));
    }

    let field = |key: &str| {
        fields
            .get(key)
            .ok_or_else(|| PluginError::MissingKey {
                option: OPTION.to_string(),
                key: key.to_string(),
            })
            .and_then(|v| value::scalar(OPTION, v))
            .and_then(|text| token(key, text))
    };

    let pattern = field("match")?;
    let target = field("to")?;
    Regex::new(&pattern).map_err(|e| PluginError::InvalidRegex {
        option: OPTION.to_string(),
        pattern: pattern.clone(),
        reason: e.to_string(),
    })?;

    let mut line = format!("{pattern} {target}");
    for &key in RULE_OPTIONS {
        if let Some(value) = fields.get(key) {
            line.push_str(&format!(" @{key}={}", rule_option(key, value)?));
        }
    }
    Ok(line)
}

impl Plugin for RegexRemap {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "regex_remap"
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

impl SharedLibrary for RegexRemap {
    fn library(&self) -> &str {
        "regex_remap.so"
    }
}

impl SubConfigFile for RegexRemap {
    fn file_name(&self) -> &str {
        "regex_remap.config"
    }

    fn sub_config(&self, env: &Environment) -> Result<String, PluginError> {
        with_option(env, OPTION, |entries| {
            let serde_yaml::Value::Sequence(entries) = entries else {
                return Err(PluginError::InvalidValue {
                    option: OPTION.to_string(),
                    expected: "a list of rules".to_string(),
                });
            };
            let lines = entries.iter().map(rule_line).collect::<Result<Vec<_>, _>>()?;
            Ok(lines.join("\n"))
        })
    }
}

impl Weighted for RegexRemap {
    fn weight(&self) -> i32 {
        150
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
    fn test_rules_written_to_side_file() {
        let rendered = render(
            &RegexRemap,
            &env(
                "regex_remap:\n\
                 \x20 - {match: '^/images/(.*)', to: 'http://img/$1'}\n\
                 \x20 - {match: '^/old/', to: 'http://www/new/', status: 301}\n",
            ),
        )
        .unwrap();
        assert_eq!(
            rendered.content,
            "@plugin=regex_remap.so @pparam=www_regex_remap.config"
        );
        assert_eq!(
            rendered.sub_config,
            "^/images/(.*) http://img/$1\n^/old/ http://www/new/ @status=301"
        );
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = RegexRemap
            .sub_config(&env("{regex_remap: [{match: '(unclosed', to: 'http://x/'}]}"))
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidRegex { pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_missing_target_rejected() {
        let err = RegexRemap
            .sub_config(&env("{regex_remap: [{match: '^/'}]}"))
            .unwrap_err();
        assert_eq!(
            err,
            PluginError::MissingKey {
                option: "regex_remap".to_string(),
                key: "to".to_string(),
            }
        );
    }

    #[test]
    fn test_pcre_constructs_accepted() {
        let rendered = render(
            &RegexRemap,
            &env(
                "regex_remap:\n\
                 \x20 - {match: '^/(?!api/)(.*)', to: 'http://o/$1'}\n\
                 \x20 - {match: '^/(a)\\1', to: 'http://o/'}\n",
            ),
        )
        .unwrap();
        assert_eq!(
            rendered.sub_config,
            "^/(?!api/)(.*) http://o/$1\n^/(a)\\1 http://o/"
        );
    }

    #[test]
    fn test_whitespace_in_fields_rejected() {
        for yaml in [
            "{regex_remap: [{match: '^/a b', to: 'http://o/'}]}",
            "{regex_remap: [{match: '^/a', to: 'http://o/ x'}]}",
            "{regex_remap: [{match: '^/a', to: ''}]}",
        ] {
            let err = RegexRemap.sub_config(&env(yaml)).unwrap_err();
            assert!(matches!(err, PluginError::InvalidValue { .. }), "{yaml}: {err}");
        }
    }

    #[test]
    fn test_rule_options_in_fixed_order() {
        let body = RegexRemap
            .sub_config(&env(
                "{regex_remap: [{match: '^/s', to: 'http://o/', dns_timeout: 50, \
                 status: 302, active_timeout: 9000}]}",
            ))
            .unwrap();
        assert_eq!(
            body,
            "^/s http://o/ @status=302 @active_timeout=9000 @dns_timeout=50"
        );
    }

    #[test]
    fn test_bad_rule_options_rejected() {
        for yaml in [
            "{regex_remap: [{match: '^/', to: 'http://o/', status: 'moved'}]}",
            "{regex_remap: [{match: '^/', to: 'http://o/', status: 42}]}",
            "{regex_remap: [{match: '^/', to: 'http://o/', connect_timeout: -1}]}",
            "{regex_remap: [{match: '^/', to: 'http://o/', caseless: true}]}",
        ] {
            let err = RegexRemap.sub_config(&env(yaml)).unwrap_err();
            assert!(matches!(err, PluginError::InvalidValue { .. }), "{yaml}: {err}");
        }
    }
}
