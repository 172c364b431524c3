//! Plugin registry
//!
//! The registry is an explicit value built once at startup from a list of
//! constructors ([`Registry::builtin`]) and then shared read-only with every
//! resolution pass. It maps:
//!
//! - type tag → plugin instance
//! - family tag → compound member types, in registration order
//! - declarative option name → owning type tag
//!
//! Binding an option name twice is not an error: the first registration
//! wins and the conflict is logged and kept in [`Registry::conflicts`] for
//! diagnosis.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use strsim::levenshtein;
use tracing::{debug, warn};

use super::{NoopPlugin, Plugin, PluginCategory, builtin, family_of};

/// Maximum allowed Levenshtein distance as a percentage of the option length
/// for "did you mean" suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// An option name claimed by more than one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionConflict {
    pub option: &'static str,
    /// Type that keeps the binding
    pub kept: &'static str,
    /// Type whose claim was ignored
    pub ignored: &'static str,
}

impl fmt::Display for OptionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "option '{}' is claimed by '{}' and '{}'; '{}' keeps it",
            self.option, self.kept, self.ignored, self.kept
        )
    }
}

/// Catalog of plugins by type tag, family and option name
#[derive(Debug, Default)]
pub struct Registry {
    plugins: HashMap<&'static str, Arc<dyn Plugin>>,
    families: HashMap<&'static str, Vec<&'static str>>,
    options: HashMap<&'static str, &'static str>,
    conflicts: Vec<OptionConflict>,
}

impl Registry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in plugin
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for plugin in builtin::all() {
            registry.register(plugin);
        }
        registry
    }

    /// Record `plugin` under its type tag and bind its option names.
    ///
    /// Compound plugins are also appended to their family's member list.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let plugin_type = plugin.plugin_type();
        if self.plugins.contains_key(plugin_type) {
            warn!("Plugin type '{}' registered twice; keeping the first", plugin_type);
            return;
        }

        if plugin.category() == PluginCategory::Compound {
            self.families
                .entry(family_of(plugin.as_ref()))
                .or_default()
                .push(plugin_type);
        }

        for &option in plugin.config_names() {
            if option.is_empty() {
                continue;
            }
            match self.options.get(option) {
                Some(&kept) => {
                    warn!(
                        "Option '{}' claimed by both '{}' and '{}'; keeping '{}'",
                        option, kept, plugin_type, kept
                    );
                    self.conflicts.push(OptionConflict {
                        option,
                        kept,
                        ignored: plugin_type,
                    });
                }
                None => {
                    self.options.insert(option, plugin_type);
                }
            }
        }

        debug!("Registered plugin '{}' ({})", plugin_type, plugin.category());
        self.plugins.insert(plugin_type, plugin);
    }

    /// Type tag owning a declarative option
    #[must_use]
    pub fn resolve_by_option(&self, option: &str) -> Option<&'static str> {
        self.options.get(option).copied()
    }

    /// Plugin for a type tag.
    ///
    /// A family tag with no plugin of that exact type resolves to the first
    /// registered member of the family.
    #[must_use]
    pub fn resolve_by_type(&self, plugin_type: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(plugin_type).cloned().or_else(|| {
            self.families
                .get(plugin_type)
                .and_then(|members| members.first())
                .and_then(|first| self.plugins.get(first).cloned())
        })
    }

    /// Plugin whose own type is exactly `plugin_type`
    #[must_use]
    pub fn plugin(&self, plugin_type: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(plugin_type).cloned()
    }

    /// Members of a compound family in registration order
    #[must_use]
    pub fn members_of(&self, family: &str) -> Vec<Arc<dyn Plugin>> {
        self.families
            .get(family)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|member| self.plugins.get(member).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace a plugin with a no-op stand-in.
    ///
    /// Disabling a family tag disables every member of the family. Option
    /// bindings are untouched so disabled options never read as unknown.
    /// Returns `false` when nothing matched.
    pub fn disable(&mut self, plugin_type: &str) -> bool {
        let mut targets: Vec<&'static str> =
            self.families.get(plugin_type).cloned().unwrap_or_default();
        if let Some((&key, _)) = self.plugins.get_key_value(plugin_type)
            && !targets.contains(&key)
        {
            targets.push(key);
        }

        for &target in &targets {
            if let Some(plugin) = self.plugins.get(target).cloned() {
                let noop: Arc<dyn Plugin> = Arc::new(NoopPlugin::replacing(plugin.as_ref()));
                self.plugins.insert(target, noop);
                debug!("Disabled plugin '{}'", target);
            }
        }
        !targets.is_empty()
    }

    /// Closest registered option name to `option`, if similar enough
    #[must_use]
    pub fn suggest(&self, option: &str) -> Option<&'static str> {
        let limit = option.len() * SIMILARITY_THRESHOLD_PERCENT / 100;
        self.options
            .keys()
            .map(|&candidate| (levenshtein(option, candidate), candidate))
            .filter(|(distance, _)| *distance <= limit)
            .min()
            .map(|(_, candidate)| candidate)
    }

    /// Option names claimed by more than one plugin
    #[must_use]
    pub fn conflicts(&self) -> &[OptionConflict] {
        &self.conflicts
    }

    /// Every plugin, sorted by type tag
    #[must_use]
    pub fn iter(&self) -> Vec<Arc<dyn Plugin>> {
        let mut plugins: Vec<_> = self.plugins.values().cloned().collect();
        plugins.sort_by_key(|p| p.plugin_type());
        plugins
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
