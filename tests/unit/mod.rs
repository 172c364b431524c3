//! Behavioral tests of the resolution engine through the public API.

use std::collections::BTreeMap;
use std::sync::Arc;

use remapgen_cli::core::ResolveError;
use remapgen_cli::plugin::{
    ContentProducer, Plugin, PluginCategory, Registry, RoleParameterProducer, SharedLibrary,
};
use remapgen_cli::resolver::render::render_role_parameters;
use remapgen_cli::resolver::{Environment, Location, MappingRule, OptionSet, Resolver};
use remapgen_cli::test_utils::{environment, init_test_logging, options};

fn resolve_at(yaml: &str, location: Location, explicit: bool) -> Vec<MappingRule> {
    init_test_logging(None);
    let registry = Registry::builtin();
    let env = environment(yaml, location);
    Resolver::new(&registry)
        .resolve(&env.options, &env, explicit)
        .unwrap()
}

fn types(rules: &[MappingRule]) -> Vec<&str> {
    rules.iter().map(|rule| rule.plugin_type.as_str()).collect()
}

#[test]
fn meta_options_resolve_to_nothing() {
    let rules = resolve_at(
        "{location: parent, locations: [parent], parent_child: true, volume: high}",
        Location::Parent,
        false,
    );
    assert!(rules.is_empty());
}

#[test]
fn unknown_options_reported_once_each() {
    let registry = Registry::builtin();
    let env = environment("{alow_ip: [10.0.0.1], nonsense: 1, compress: true}", Location::Child);

    let errors = Resolver::new(&registry)
        .resolve(&env.options, &env, false)
        .unwrap_err();

    assert_eq!(errors.unknown_options(), vec!["alow_ip", "nonsense"]);
    let suggestion = errors.iter().find_map(|error| match error {
        ResolveError::UnknownOption { name, suggestion } if name == "alow_ip" => {
            suggestion.clone()
        }
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("allow_ip"));
}

#[test]
fn resolution_is_deterministic() {
    let yaml = "{set_headers: {X-B: '2', X-A: '1'}, receipt: true, compress: true, \
                allow_ip: [10.0.0.1, 10.0.0.2], cache_key_params: [b, a], \
                regex_remap: [{match: '^/old/(.*)', to: 'http://origin/new/$1'}]}";
    let first = resolve_at(yaml, Location::Child, false);
    let second = resolve_at(yaml, Location::Child, false);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn aliased_handler_runs_once_whatever_the_insertion_order() {
    let mut forward = OptionSet::new();
    forward.insert("allow_ip".to_string(), serde_yaml::from_str("[10.0.0.1]").unwrap());
    forward.insert("ip_allow".to_string(), serde_yaml::from_str("[10.0.0.2]").unwrap());

    let mut backward = OptionSet::new();
    backward.insert("ip_allow".to_string(), serde_yaml::from_str("[10.0.0.2]").unwrap());
    backward.insert("allow_ip".to_string(), serde_yaml::from_str("[10.0.0.1]").unwrap());

    let registry = Registry::builtin();
    let resolver = Resolver::new(&registry);
    let resolve = |options: &OptionSet| {
        let env = Environment::new("www", options.clone());
        resolver.resolve(options, &env, false).unwrap()
    };

    let rules = resolve(&forward);
    assert_eq!(rules, resolve(&backward));
    assert_eq!(types(&rules), vec!["allow_ip"]);
    assert_eq!(
        rules[0].content.as_deref(),
        Some("@src_ip=10.0.0.1 @src_ip=10.0.0.2 @action=allow")
    );
}

#[test]
fn rules_ordered_by_weight() {
    let rules = resolve_at(
        "{regex_remap: [{match: '^/a', to: 'http://o/b'}], \
          allow_ip: [10.0.0.1], \
          overrides: {proxy.config.http.cache.http: '0'}}",
        Location::Unspecified,
        false,
    );
    let weights: Vec<i32> = rules.iter().map(|rule| rule.weight).collect();
    assert_eq!(weights, vec![15, 120, 150]);
    assert_eq!(types(&rules), vec!["conf_remap", "allow_ip", "regex_remap"]);
}

#[test]
fn parent_only_handler_filtered_at_child() {
    let yaml = "{cache_range_requests: true}";
    assert!(resolve_at(yaml, Location::Child, false).is_empty());

    let explicit = resolve_at(yaml, Location::Child, true);
    assert_eq!(types(&explicit), vec!["cache_range"]);

    let parent = resolve_at(yaml, Location::Parent, false);
    assert_eq!(
        parent[0].content.as_deref(),
        Some("@plugin=cache_range_requests.so @pparam=--ps-cachekey")
    );
}

#[test]
fn receipt_leads_its_family() {
    let rules = resolve_at(
        "{set_headers: {X-Served-By: edge}, remove_headers: [Server], receipt: true}",
        Location::Child,
        false,
    );
    assert_eq!(types(&rules), vec!["header_rewrite"]);

    let rule = &rules[0];
    assert_eq!(
        rule.content.as_deref(),
        Some("@plugin=header_rewrite.so @pparam=www_header_rewrite.config")
    );
    assert_eq!(rule.sub_config_name.as_deref(), Some("www_header_rewrite.config"));

    let body = rule.sub_config.as_deref().unwrap();
    let receipt = body.find("X-Receipt").unwrap();
    let removed = body.find("rm-header Server").unwrap();
    let set = body.find("set-header X-Served-By").unwrap();
    assert!(receipt < removed);
    assert!(receipt < set);
}

#[test]
fn family_side_file_follows_location_and_mapping() {
    let registry = Registry::builtin();
    let env = Environment::new("www", options("{receipt: true}"))
        .with_location(Location::Parent)
        .with_id(2);
    let rules = Resolver::new(&registry)
        .resolve(&env.options, &env, false)
        .unwrap();
    assert_eq!(
        rules[0].sub_config_name.as_deref(),
        Some("www_header_rewrite_2_parent.config")
    );
}

#[test]
fn role_parameters_render_guarded_blocks() {
    let mut roles = BTreeMap::new();
    roles.insert("default".to_string(), vec!["--policy=lru".to_string()]);
    roles.insert("roles_x".to_string(), vec!["--extra=1".to_string()]);

    assert_eq!(
        render_role_parameters(&roles),
        "@pparam=--policy=lru\n{% if \"roles_x\" in roles %}\n@pparam=--extra=1\n{% endif %}"
    );
}

/// General plugin that renders nothing unless its option is `on`
#[derive(Debug)]
struct Quiet;

impl Plugin for Quiet {
    fn category(&self) -> PluginCategory {
        PluginCategory::General
    }

    fn plugin_type(&self) -> &'static str {
        "quiet"
    }

    fn config_names(&self) -> &'static [&'static str] {
        &["quiet"]
    }

    fn as_content(&self) -> Option<&dyn ContentProducer> {
        Some(self)
    }
}

impl ContentProducer for Quiet {
    fn content(
        &self,
        env: &Environment,
    ) -> Result<String, remapgen_cli::core::PluginError> {
        Ok(match env.option("quiet").and_then(|v| v.as_str()) {
            Some("on") => "@quiet".to_string(),
            _ => String::new(),
        })
    }
}

#[test]
fn empty_output_contributes_no_rule() {
    let mut registry = Registry::builtin();
    registry.register(Arc::new(Quiet));
    let resolver = Resolver::new(&registry);

    let env = Environment::new("www", options("{quiet: off, compress: false}"));
    assert!(resolver.resolve(&env.options, &env, false).unwrap().is_empty());

    let env = Environment::new("www", options("{quiet: on}"));
    let rules = resolver.resolve(&env.options, &env, false).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].content.as_deref(), Some("@quiet"));
    assert_eq!(rules[0].weight, 5);
}

#[test]
fn allow_ip_end_to_end() {
    let registry = Registry::builtin();
    let rules = resolve_at(
        "{allow_ip: [10.0.0.0-10.255.255.255]}",
        Location::Unspecified,
        false,
    );

    assert_eq!(rules.len(), 1);
    let rule = &rules[0];
    assert_eq!(rule.weight, 120);
    assert_eq!(
        rule.content.as_deref(),
        Some("@src_ip=10.0.0.0-10.255.255.255 @action=allow")
    );
    assert_eq!(rule.sub_config, rule.content);
    assert!(rule.sub_config_name.is_none());

    let plugin = registry.plugin(&rule.plugin_type).unwrap();
    assert_eq!(plugin.category(), PluginCategory::Action);
}

#[test]
fn disabled_plugin_is_silent() {
    let mut registry = Registry::builtin();
    assert!(registry.disable("compress"));
    let env = Environment::new("www", options("{compress: true, allow_ip: [10.0.0.1]}"));

    let rules = Resolver::new(&registry)
        .resolve(&env.options, &env, false)
        .unwrap();
    assert_eq!(types(&rules), vec!["allow_ip"]);
    assert!(registry.plugin("compress").unwrap().as_shared_library().is_none());
}

#[test]
fn plugin_failures_collected_with_unknown_options() {
    let registry = Registry::builtin();
    let env = Environment::new(
        "www",
        options("{allow_ip: [not-an-address], regex_remap: [{match: '(', to: 'http://o'}], bogus: 1}"),
    );

    let errors = Resolver::new(&registry)
        .resolve(&env.options, &env, false)
        .unwrap_err();
    assert_eq!(errors.len(), 3);
    let rendered: Vec<&str> = errors
        .iter()
        .filter_map(|error| match error {
            ResolveError::Render { plugin_type, .. } => Some(plugin_type.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(rendered, vec!["allow_ip", "regex_remap"]);
}

#[test]
fn role_parameter_producer_through_resolver() {
    #[derive(Debug)]
    struct Promote;

    impl Plugin for Promote {
        fn category(&self) -> PluginCategory {
            PluginCategory::General
        }
        fn plugin_type(&self) -> &'static str {
            "promote"
        }
        fn config_names(&self) -> &'static [&'static str] {
            &["promote"]
        }
        fn as_role_parameters(&self) -> Option<&dyn RoleParameterProducer> {
            Some(self)
        }
        fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
            Some(self)
        }
    }

    impl RoleParameterProducer for Promote {
        fn role_parameters(
            &self,
            _env: &Environment,
        ) -> Result<BTreeMap<String, Vec<String>>, remapgen_cli::core::PluginError> {
            Ok(BTreeMap::from([
                ("roles_x".to_string(), vec!["--extra=1".to_string()]),
                ("default".to_string(), vec!["--policy=lru".to_string()]),
            ]))
        }
    }

    impl SharedLibrary for Promote {
        fn library(&self) -> &str {
            "promote.so"
        }
    }

    let mut registry = Registry::new();
    registry.register(Arc::new(Promote));
    let env = Environment::new("www", options("{promote: true}"));
    let rules = Resolver::new(&registry)
        .resolve(&env.options, &env, false)
        .unwrap();

    assert_eq!(
        rules[0].content.as_deref(),
        Some(
            "@plugin=promote.so @pparam=--policy=lru\n\
             {% if \"roles_x\" in roles %}\n@pparam=--extra=1\n{% endif %}"
        )
    );
}
