//! Mapping-rule resolution for remapgen.
//!
//! The resolver turns the option set of one (mapping, location) pair into an
//! ordered list of [`MappingRule`]s. It knows nothing about individual
//! features: every option is handed to the plugin that claims it in the
//! [`Registry`], and the plugin's facets decide what the rule looks like.
//!
//! # Resolution Process
//!
//! 1. **Option walk**: options are visited in lexicographic order
//!    ([`OptionSet`] is a `BTreeMap`). Meta-options that only steer mapping
//!    expansion are skipped.
//! 2. **Lookup**: each option resolves to a type tag, then to a plugin.
//!    Unknown options are collected as errors with a "did you mean"
//!    suggestion; resolution continues.
//! 3. **Location filter**: location-restricted plugins are skipped outside
//!    their locations unless the mapping is explicit.
//! 4. **Dispatch by category**:
//!    - `General`: one rule from the plugin's rendered output
//!    - `Action`: one rule whose inline and side content are the same text
//!    - `Compound`: deferred into its family bucket
//! 5. **Family merge**: each family (in family-tag order) becomes one rule,
//!    see [`compound`].
//! 6. **Ordering**: rules are stable-sorted by ascending weight.
//!
//! A pass that recorded any error returns every error and no rules.
//!
//! # Example
//!
//! ```rust,no_run
//! use remapgen_cli::plugin::Registry;
//! use remapgen_cli::resolver::{Environment, OptionSet, Resolver};
//!
//! let registry = Registry::builtin();
//! let mut options = OptionSet::new();
//! options.insert(
//!     "allow_ip".to_string(),
//!     serde_yaml::from_str("[10.0.0.0-10.255.255.255]").unwrap(),
//! );
//! let env = Environment::new("www", options.clone());
//!
//! let rules = Resolver::new(&registry).resolve(&options, &env, false).unwrap();
//! assert_eq!(rules[0].weight, 120);
//! ```

pub mod compound;
pub mod environment;
pub mod render;
pub mod rule;

pub use environment::{Environment, Location, OptionSet};
pub use render::{Rendered, render};
pub use rule::MappingRule;

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, trace};

use crate::core::{ResolveError, ResolveErrors};
use crate::plugin::{PluginCategory, Registry, applies_at, family_of, weight_of};

/// Options that steer mapping expansion and never reach a plugin.
pub const META_OPTIONS: &[&str] = &["location", "locations", "parent_child", "volume"];

/// Resolves option sets against a plugin registry.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub const fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolve one option set into ordered rules.
    ///
    /// `explicit` disables location filtering for this pass. Rules with no
    /// output are dropped.
    ///
    /// # Errors
    ///
    /// Returns every error found during the pass: unknown options, dangling
    /// type tags and plugin render failures.
    pub fn resolve(
        &self,
        options: &OptionSet,
        env: &Environment,
        explicit: bool,
    ) -> Result<Vec<MappingRule>, ResolveErrors> {
        let mut errors = Vec::new();
        let mut rules = Vec::new();
        let mut processed: HashSet<&'static str> = HashSet::new();
        let mut families: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();

        for name in options.keys() {
            if META_OPTIONS.contains(&name.as_str()) {
                continue;
            }

            let Some(plugin_type) = self.registry.resolve_by_option(name) else {
                errors.push(ResolveError::UnknownOption {
                    name: name.clone(),
                    suggestion: self.registry.suggest(name).map(str::to_string),
                });
                continue;
            };

            let Some(plugin) = self.registry.resolve_by_type(plugin_type) else {
                errors.push(ResolveError::UnresolvableHandler {
                    plugin_type: plugin_type.to_string(),
                });
                continue;
            };

            // Plugins read their own options from `env`, so a plugin claiming
            // several names must run once. Which name triggers it depends on
            // sorted option order; plugins must not depend on that name.
            if !processed.insert(plugin.plugin_type()) {
                trace!("Option '{}' already handled by '{}'", name, plugin.plugin_type());
                continue;
            }

            if !applies_at(plugin.as_ref(), env.location, explicit) {
                trace!(
                    "Skipping '{}': not applicable at {} location",
                    plugin.plugin_type(),
                    env.location
                );
                continue;
            }

            match plugin.category() {
                PluginCategory::Compound => {
                    families
                        .entry(family_of(plugin.as_ref()))
                        .or_default()
                        .push(plugin.plugin_type());
                }
                category => match render(plugin.as_ref(), env) {
                    Ok(rendered) => {
                        let rule =
                            MappingRule::new(plugin.plugin_type(), weight_of(plugin.as_ref()));
                        let rule = if category == PluginCategory::Action {
                            rule.with_content(rendered.content.clone())
                                .with_sub_config(rendered.content, None)
                        } else {
                            rule.with_content(rendered.content)
                                .with_sub_config(rendered.sub_config, rendered.file_name)
                        };
                        rules.push(rule);
                    }
                    Err(source) => errors.push(ResolveError::Render {
                        plugin_type: plugin.plugin_type().to_string(),
                        source,
                    }),
                },
            }
        }

        for (family, members) in &families {
            match compound::merge_family(self.registry, family, members, env) {
                Ok(rule) => rules.push(rule),
                Err(family_errors) => errors.extend(family_errors),
            }
        }

        if !errors.is_empty() {
            return Err(ResolveErrors::new(errors));
        }

        rules.retain(MappingRule::has_content);
        rules.sort_by_key(|rule| rule.weight);

        for rule in &rules {
            debug!(
                "Resolved '{}' (weight {}) for {} at {}",
                rule.plugin_type, rule.weight, env.property, env.location
            );
        }
        Ok(rules)
    }
}
