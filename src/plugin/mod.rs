//! Plugin capability protocol
//!
//! A plugin owns one declarative feature (IP allow lists, compression, header
//! rewrites, ...). Besides the three mandatory properties every plugin has -
//! its [`PluginCategory`], its type tag and the option names it claims - a
//! plugin implements any subset of optional facets:
//!
//! | Facet | Trait | Accessor |
//! |---|---|---|
//! | raw inline directive text | [`ContentProducer`] | [`Plugin::as_content`] |
//! | flat parameter list | [`ParameterProducer`] | [`Plugin::as_parameters`] |
//! | per-role parameter lists | [`RoleParameterProducer`] | [`Plugin::as_role_parameters`] |
//! | output guarded by a host role | [`RoleGated`] | [`Plugin::as_role_gated`] |
//! | backed by a shared library | [`SharedLibrary`] | [`Plugin::as_shared_library`] |
//! | writes a side configuration file | [`SubConfigFile`] | [`Plugin::as_sub_config`] |
//! | passes its file behind a flag | [`ConfigFileSwitch`] | [`Plugin::as_config_switch`] |
//! | valid only at some locations | [`LocationRestricted`] | [`Plugin::as_location_restricted`] |
//! | member of a compound family | [`CompoundMember`] | [`Plugin::as_compound_member`] |
//! | custom ordering weight | [`Weighted`] | [`Plugin::as_weighted`] |
//!
//! The engine never inspects a plugin beyond these accessors. A facet is
//! present when its accessor returns `Some`; implementors opt in with
//! `fn as_x(&self) -> Option<&dyn X> { Some(self) }`.

pub mod builtin;
pub mod registry;
pub mod value;

pub use registry::{OptionConflict, Registry};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::PluginError;
use crate::resolver::{Environment, Location};

/// Weight of a rule whose plugin does not declare one
pub const DEFAULT_WEIGHT: i32 = 5;

/// Role key holding the unconditional tokens of a [`RoleParameterProducer`]
pub const DEFAULT_ROLE: &str = "default";

/// Compound member type that always renders first within its family
pub const RECEIPT: &str = "receipt";

/// How the engine builds rules from a plugin's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginCategory {
    /// One rule per plugin, with optional side file
    General,
    /// One rule per plugin whose inline and side content are the same buffer
    Action,
    /// Deferred into a family bucket and merged into one rule per family
    Compound,
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Action => write!(f, "action"),
            Self::Compound => write!(f, "compound"),
        }
    }
}

/// How flat parameter tokens are written into directive text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterStyle {
    /// `@pparam=<token>`
    #[default]
    Formal,
    /// `<token>` written as-is
    Raw,
}

/// A capability-providing unit responsible for one declarative feature
pub trait Plugin: Send + Sync + fmt::Debug {
    /// How rules are built from this plugin's output
    fn category(&self) -> PluginCategory;

    /// Unique type tag
    fn plugin_type(&self) -> &'static str;

    /// Declarative option names this plugin owns
    fn config_names(&self) -> &'static [&'static str];

    fn as_content(&self) -> Option<&dyn ContentProducer> {
        None
    }

    fn as_parameters(&self) -> Option<&dyn ParameterProducer> {
        None
    }

    fn as_role_parameters(&self) -> Option<&dyn RoleParameterProducer> {
        None
    }

    fn as_role_gated(&self) -> Option<&dyn RoleGated> {
        None
    }

    fn as_shared_library(&self) -> Option<&dyn SharedLibrary> {
        None
    }

    fn as_sub_config(&self) -> Option<&dyn SubConfigFile> {
        None
    }

    fn as_config_switch(&self) -> Option<&dyn ConfigFileSwitch> {
        None
    }

    fn as_location_restricted(&self) -> Option<&dyn LocationRestricted> {
        None
    }

    fn as_compound_member(&self) -> Option<&dyn CompoundMember> {
        None
    }

    fn as_weighted(&self) -> Option<&dyn Weighted> {
        None
    }
}

/// Produces raw directive text for the rule line
pub trait ContentProducer {
    fn content(&self, env: &Environment) -> Result<String, PluginError>;
}

/// Produces a flat list of parameter tokens
pub trait ParameterProducer {
    fn parameters(&self, env: &Environment) -> Result<Vec<String>, PluginError>;

    fn style(&self) -> ParameterStyle {
        ParameterStyle::Formal
    }
}

/// Produces parameter tokens per host role.
///
/// The [`DEFAULT_ROLE`] entry is rendered unconditionally, every other
/// entry inside a role guard.
pub trait RoleParameterProducer {
    fn role_parameters(
        &self,
        env: &Environment,
    ) -> Result<BTreeMap<String, Vec<String>>, PluginError>;
}

/// Output only applies on hosts carrying a role
pub trait RoleGated {
    fn role(&self) -> &str;
}

/// Backed by a proxy plugin library (`@plugin=<library>`)
pub trait SharedLibrary {
    fn library(&self) -> &str;
}

/// Writes a side configuration file referenced from the rule line
pub trait SubConfigFile {
    /// Declared base name, e.g. `compress.config` or `script.lua`
    fn file_name(&self) -> &str;

    /// Body of the side file; empty means the plugin has nothing to say
    fn sub_config(&self, env: &Environment) -> Result<String, PluginError>;
}

/// Passes its side file behind a flag (`@pparam=--config=<file>`)
pub trait ConfigFileSwitch {
    fn switch(&self) -> &str;
}

/// Applies only at the listed locations
pub trait LocationRestricted {
    fn locations(&self) -> &[Location];
}

/// Member of a compound family; the family base has `family() == plugin_type()`
pub trait CompoundMember {
    fn family(&self) -> &'static str;
}

/// Custom ordering weight; lower weights come first
pub trait Weighted {
    fn weight(&self) -> i32;
}

/// Effective ordering weight of a plugin
#[must_use]
pub fn weight_of(plugin: &dyn Plugin) -> i32 {
    plugin.as_weighted().map_or(DEFAULT_WEIGHT, |w| w.weight())
}

/// Family tag a compound plugin is filed under
#[must_use]
pub fn family_of(plugin: &dyn Plugin) -> &'static str {
    plugin
        .as_compound_member()
        .map_or_else(|| plugin.plugin_type(), |member| member.family())
}

/// Whether `plugin` applies at `location`.
///
/// `Unspecified` locations and unrestricted plugins always apply; explicit
/// mappings bypass the restriction entirely.
#[must_use]
pub fn applies_at(plugin: &dyn Plugin, location: Location, explicit: bool) -> bool {
    if explicit || location == Location::Unspecified {
        return true;
    }
    plugin
        .as_location_restricted()
        .is_none_or(|restricted| restricted.locations().contains(&location))
}

/// Stand-in for a disabled plugin.
///
/// Keeps the identity of the plugin it replaces so registry lookups stay
/// total, but implements no output facet.
#[derive(Debug, Clone)]
pub struct NoopPlugin {
    category: PluginCategory,
    plugin_type: &'static str,
    config_names: &'static [&'static str],
    family: Option<&'static str>,
}

impl NoopPlugin {
    /// Mirror the identity of `plugin`
    #[must_use]
    pub fn replacing(plugin: &dyn Plugin) -> Self {
        Self {
            category: plugin.category(),
            plugin_type: plugin.plugin_type(),
            config_names: plugin.config_names(),
            family: plugin.as_compound_member().map(|member| member.family()),
        }
    }
}

impl Plugin for NoopPlugin {
    fn category(&self) -> PluginCategory {
        self.category
    }

    fn plugin_type(&self) -> &'static str {
        self.plugin_type
    }

    fn config_names(&self) -> &'static [&'static str] {
        self.config_names
    }

    fn as_compound_member(&self) -> Option<&dyn CompoundMember> {
        self.family.map(|_| self as &dyn CompoundMember)
    }
}

impl CompoundMember for NoopPlugin {
    fn family(&self) -> &'static str {
        self.family.unwrap_or(self.plugin_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct ParentOnly;

    impl Plugin for ParentOnly {
        fn category(&self) -> PluginCategory {
            PluginCategory::General
        }
        fn plugin_type(&self) -> &'static str {
            "parent_only"
        }
        fn config_names(&self) -> &'static [&'static str] {
            &["parent_only"]
        }
        fn as_location_restricted(&self) -> Option<&dyn LocationRestricted> {
            Some(self)
        }
    }

    impl LocationRestricted for ParentOnly {
        fn locations(&self) -> &[Location] {
            &[Location::Parent]
        }
    }

    #[test]
    fn test_applies_at_respects_restriction() {
        assert!(applies_at(&ParentOnly, Location::Parent, false));
        assert!(!applies_at(&ParentOnly, Location::Child, false));
        assert!(applies_at(&ParentOnly, Location::Child, true));
        assert!(applies_at(&ParentOnly, Location::Unspecified, false));
    }

    #[test]
    fn test_default_weight_and_family() {
        assert_eq!(weight_of(&ParentOnly), DEFAULT_WEIGHT);
        assert_eq!(family_of(&ParentOnly), "parent_only");
    }

    #[test]
    fn test_noop_keeps_identity_only() {
        let noop = NoopPlugin::replacing(&ParentOnly);
        assert_eq!(noop.plugin_type(), "parent_only");
        assert_eq!(noop.config_names(), &["parent_only"]);
        assert!(noop.as_location_restricted().is_none());
        assert!(noop.as_compound_member().is_none());
    }
}
