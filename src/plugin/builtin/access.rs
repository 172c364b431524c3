//! Remap ACL filters: source address and method lists.

use std::net::IpAddr;

use super::{value, with_option};
use crate::core::PluginError;
use crate::plugin::{
    ContentProducer, ParameterProducer, ParameterStyle, Plugin, PluginCategory, Weighted,
};
use crate::resolver::Environment;

const ACL_WEIGHT: i32 = 120;
const METHODS_WEIGHT: i32 = 110;

/// Check one address, `a-b` range or CIDR network.
fn validate_address(option: &str, entry: &str) -> Result<(), PluginError> {
    let invalid = || PluginError::InvalidAddress {
        option: option.to_string(),
        value: entry.to_string(),
    };

    if let Some((start, end)) = entry.split_once('-') {
        let start: IpAddr = start.trim().parse().map_err(|_| invalid())?;
        let end: IpAddr = end.trim().parse().map_err(|_| invalid())?;
        if start.is_ipv4() != end.is_ipv4() || start > end {
            return Err(invalid());
        }
        return Ok(());
    }

    if let Some((network, prefix)) = entry.split_once('/') {
        let network: IpAddr = network.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(invalid());
        }
        return Ok(());
    }

    entry.parse::<IpAddr>().map(|_| ()).map_err(|_| invalid())
}

/// `@src_ip=<entry>` for every entry of every option name, then the action.
fn acl(plugin: &dyn Plugin, env: &Environment, action: &str) -> Result<String, PluginError> {
    let mut tokens = Vec::new();
    for &option in plugin.config_names() {
        let entries = with_option(env, option, |v| value::string_list(option, v))?;
        for entry in entries {
            validate_address(option, &entry)?;
            tokens.push(format!("@src_ip={entry}"));
        }
    }
    if tokens.is_empty() {
        return Ok(String::new());
    }
    tokens.push(format!("@action={action}"));
    Ok(tokens.join(" "))
}

/// Allow only listed source addresses
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowIp;

impl Plugin for AllowIp {
    fn category(&self) -> PluginCategory {
        PluginCategory::Action
    }

    fn plugin_type(&self) -> &'static str {
        "allow_ip"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &["allow_ip", "ip_allow"]
    }

    fn as_content(&self) -> Option<&dyn ContentProducer> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl ContentProducer for AllowIp {
    fn content(&self, env: &Environment) -> Result<String, PluginError> {
        acl(self, env, "allow")
    }
}

impl Weighted for AllowIp {
    fn weight(&self) -> i32 {
        ACL_WEIGHT
    }
}

/// Reject listed source addresses
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyIp;

impl Plugin for DenyIp {
    fn category(&self) -> PluginCategory {
        PluginCategory::Action
    }

    fn plugin_type(&self) -> &'static str {
        "deny_ip"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &["deny_ip"]
    }

    fn as_content(&self) -> Option<&dyn ContentProducer> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl ContentProducer for DenyIp {
    fn content(&self, env: &Environment) -> Result<String, PluginError> {
        acl(self, env, "deny")
    }
}

impl Weighted for DenyIp {
    fn weight(&self) -> i32 {
        ACL_WEIGHT
    }
}

/// Allow only listed request methods
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpMethods;

impl Plugin for HttpMethods {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "http_methods"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &["allow_methods"]
    }

    fn as_parameters(&self) -> Option<&dyn ParameterProducer> {
        Some(self)
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        Some(self)
    }
}

impl ParameterProducer for HttpMethods {
    fn parameters(&self, env: &Environment) -> Result<Vec<String>, PluginError> {
        let option = "allow_methods";
        let methods = with_option(env, option, |v| value::string_list(option, v))?;
        if methods.is_empty() {
            return Ok(Vec::new());
        }

        let mut tokens = Vec::with_capacity(methods.len() + 1);
        for method in methods {
            if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(PluginError::InvalidValue {
                    option: option.to_string(),
                    expected: "a list of HTTP method names".to_string(),
                });
            }
            tokens.push(format!("@method={}", method.to_ascii_uppercase()));
        }
        tokens.push("@action=allow".to_string());
        Ok(tokens)
    }

    fn style(&self) -> ParameterStyle {
        ParameterStyle::Raw
    }
}

impl Weighted for HttpMethods {
    fn weight(&self) -> i32 {
        METHODS_WEIGHT
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
    fn test_validate_address_forms() {
        assert!(validate_address("allow_ip", "10.0.0.0-10.255.255.255").is_ok());
        assert!(validate_address("allow_ip", "192.168.1.0/24").is_ok());
        assert!(validate_address("allow_ip", "::1").is_ok());
        assert!(validate_address("allow_ip", "10.0.0.1-::1").is_err());
        assert!(validate_address("allow_ip", "10.0.0.9-10.0.0.1").is_err());
        assert!(validate_address("allow_ip", "10.0.0.0/33").is_err());
        assert!(validate_address("allow_ip", "not-an-ip").is_err());
    }

    #[test]
    fn test_allow_ip_content() {
        let content = AllowIp
            .content(&env("{allow_ip: [10.0.0.0-10.255.255.255, 127.0.0.1]}"))
            .unwrap();
        assert_eq!(
            content,
            "@src_ip=10.0.0.0-10.255.255.255 @src_ip=127.0.0.1 @action=allow"
        );
    }

    #[test]
    fn test_allow_ip_reads_every_alias() {
        let content = AllowIp
            .content(&env("{ip_allow: [127.0.0.1], allow_ip: [10.0.0.1]}"))
            .unwrap();
        assert_eq!(content, "@src_ip=10.0.0.1 @src_ip=127.0.0.1 @action=allow");
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        assert_eq!(DenyIp.content(&env("{deny_ip: []}")).unwrap(), "");
    }

    #[test]
    fn test_bad_address_is_reported() {
        let err = DenyIp.content(&env("{deny_ip: [10.0.0.300]}")).unwrap_err();
        assert!(matches!(err, PluginError::InvalidAddress { value, .. } if value == "10.0.0.300"));
    }

    #[test]
    fn test_methods_are_raw_tokens() {
        let tokens = HttpMethods
            .parameters(&env("{allow_methods: [get, HEAD]}"))
            .unwrap();
        assert_eq!(tokens, vec!["@method=GET", "@method=HEAD", "@action=allow"]);
        assert_eq!(HttpMethods.style(), ParameterStyle::Raw);
        assert!(HttpMethods.parameters(&env("{allow_methods: [\"GET /\"]}")).is_err());
    }
}
