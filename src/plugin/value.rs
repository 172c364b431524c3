//! Structural coercion of option values.
//!
//! Property files are validated upstream; plugins only check the shape they
//! need (scalar, list or map) and fail with [`PluginError::InvalidValue`]
//! when it is wrong.

use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::core::PluginError;

fn invalid(option: &str, expected: &str) -> PluginError {
    PluginError::InvalidValue {
        option: option.to_string(),
        expected: expected.to_string(),
    }
}

/// Render a scalar as text. Strings, numbers and booleans qualify.
pub fn scalar(option: &str, value: &Value) -> Result<String, PluginError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Tagged(tagged) => scalar(option, &tagged.value),
        _ => Err(invalid(option, "a scalar value")),
    }
}

/// A list of scalars. A bare scalar is rejected.
pub fn string_list(option: &str, value: &Value) -> Result<Vec<String>, PluginError> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar(option, item).map_err(|_| invalid(option, "a list of scalars")))
            .collect(),
        Value::Tagged(tagged) => string_list(option, &tagged.value),
        _ => Err(invalid(option, "a list of scalars")),
    }
}

/// A map of scalar keys to scalar values, sorted by key.
pub fn string_map(option: &str, value: &Value) -> Result<BTreeMap<String, String>, PluginError> {
    let Value::Mapping(mapping) = value else {
        return Err(invalid(option, "a map of scalar values"));
    };
    mapping
        .iter()
        .map(|(k, v)| {
            let key = scalar(option, k).map_err(|_| invalid(option, "a map with scalar keys"))?;
            let value = scalar(option, v).map_err(|_| invalid(option, "a map of scalar values"))?;
            Ok((key, value))
        })
        .collect()
}

/// A nested map whose values stay untyped, sorted by key.
pub fn nested_map<'a>(
    option: &str,
    value: &'a Value,
) -> Result<BTreeMap<String, &'a Value>, PluginError> {
    let Value::Mapping(mapping) = value else {
        return Err(invalid(option, "a map"));
    };
    mapping
        .iter()
        .map(|(k, v)| {
            let key = scalar(option, k).map_err(|_| invalid(option, "a map with scalar keys"))?;
            Ok((key, v))
        })
        .collect()
}

/// A boolean switch.
pub fn flag(option: &str, value: &Value) -> Result<bool, PluginError> {
    value.as_bool().ok_or_else(|| invalid(option, "true or false"))
}

/// A non-negative integer.
pub fn unsigned(option: &str, value: &Value) -> Result<u64, PluginError> {
    value
        .as_u64()
        .ok_or_else(|| invalid(option, "a non-negative integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_scalar_accepts_numbers_and_bools() {
        assert_eq!(scalar("ttl", &yaml("3600")).unwrap(), "3600");
        assert_eq!(scalar("on", &yaml("true")).unwrap(), "true");
        assert!(scalar("x", &yaml("[1]")).is_err());
    }

    #[test]
    fn test_string_list_rejects_bare_scalar() {
        let err = string_list("allow_ip", &yaml("10.0.0.1")).unwrap_err();
        assert_eq!(
            err,
            PluginError::InvalidValue {
                option: "allow_ip".to_string(),
                expected: "a list of scalars".to_string(),
            }
        );
        assert_eq!(
            string_list("allow_ip", &yaml("[a, 2]")).unwrap(),
            vec!["a".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn test_string_map_is_sorted() {
        let map = string_map("set_headers", &yaml("{b: 2, a: one}")).unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map["b"], "2");
    }

    #[test]
    fn test_flag_and_unsigned() {
        assert!(flag("compress", &yaml("true")).unwrap());
        assert!(flag("compress", &yaml("yes please")).is_err());
        assert_eq!(unsigned("cache_ttl", &yaml("60")).unwrap(), 60);
        assert!(unsigned("cache_ttl", &yaml("-1")).is_err());
    }
}
