//! Per-pass resolution context.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declarative options of one mapping, keyed by option name.
///
/// A `BTreeMap` so that every walk over the options is lexicographic; output
/// order depends on it.
pub type OptionSet = BTreeMap<String, serde_yaml::Value>;

/// Which tier of the proxy a rule is compiled for
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// Location-agnostic
    #[default]
    Unspecified,
    /// Edge tier facing clients
    Child,
    /// Parent (mid) tier facing origins
    Parent,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Child => write!(f, "child"),
            Self::Parent => write!(f, "parent"),
        }
    }
}

/// Read-only context of one resolution pass.
///
/// Built once per (mapping, location) pair by the caller.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Property the mapping belongs to; prefixes side file names
    pub property: String,
    /// Full option set of the mapping
    pub options: OptionSet,
    /// Target location of this pass
    pub location: Location,
    /// Index of the mapping within its property; `0` for the first
    pub id: usize,
}

impl Environment {
    pub fn new(property: impl Into<String>, options: OptionSet) -> Self {
        Self {
            property: property.into(),
            options,
            location: Location::Unspecified,
            id: 0,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    /// Value of one declarative option
    pub fn option(&self, name: &str) -> Option<&serde_yaml::Value> {
        self.options.get(name)
    }
}
