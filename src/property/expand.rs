//! Mapping expansion
//!
//! Each mapping becomes one [`Target`] per location it is compiled for:
//!
//! - `locations: [child, parent]` (or `location: parent`) names them;
//! - otherwise `parent_child: true` means both tiers;
//! - otherwise the mapping is location-agnostic.
//!
//! Expansion also validates everything about a mapping that does not depend
//! on plugins. Every problem in the property is collected before failing.

use std::collections::BTreeSet;

use serde_yaml::Value;

use super::{PropertySpec, SCHEMES};
use crate::core::RemapError;
use crate::resolver::{Environment, Location, OptionSet};

/// One (mapping, location) pair ready for resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Index of the mapping within its property
    pub id: usize,
    pub location: Location,
    pub explicit: bool,
    /// Source URLs, `scheme://alias`
    pub from: Vec<String>,
    /// Origin URL
    pub to: String,
    /// Merged property and mapping options
    pub options: OptionSet,
}

impl Target {
    /// Resolution environment of this target
    #[must_use]
    pub fn environment(&self, property: &str) -> Environment {
        Environment::new(property, self.options.clone())
            .with_location(self.location)
            .with_id(self.id)
    }

    /// Short description for error messages
    #[must_use]
    pub fn label(&self) -> String {
        format!("mapping #{}, {} location", self.id, self.location)
    }
}

fn parse_location(property: &str, value: &Value) -> Result<Location, RemapError> {
    match value.as_str() {
        Some("child") => Ok(Location::Child),
        Some("parent") => Ok(Location::Parent),
        _ => Err(RemapError::InvalidMapping {
            property: property.to_string(),
            reason: format!("location must be 'child' or 'parent', got {value:?}"),
        }),
    }
}

/// Locations a mapping's options ask for
fn locations(property: &str, options: &OptionSet) -> Result<Vec<Location>, RemapError> {
    if let Some(value) = options.get("locations") {
        let Value::Sequence(entries) = value else {
            return Err(RemapError::InvalidMapping {
                property: property.to_string(),
                reason: "'locations' must be a list".to_string(),
            });
        };
        let set = entries
            .iter()
            .map(|entry| parse_location(property, entry))
            .collect::<Result<BTreeSet<_>, _>>()?;
        if set.is_empty() {
            return Err(RemapError::InvalidMapping {
                property: property.to_string(),
                reason: "'locations' must not be empty".to_string(),
            });
        }
        return Ok(set.into_iter().collect());
    }

    if let Some(value) = options.get("location") {
        return Ok(vec![parse_location(property, value)?]);
    }

    match options.get("parent_child") {
        Some(Value::Bool(true)) => Ok(vec![Location::Child, Location::Parent]),
        Some(Value::Bool(false)) | None => Ok(vec![Location::Unspecified]),
        Some(_) => Err(RemapError::InvalidMapping {
            property: property.to_string(),
            reason: "'parent_child' must be true or false".to_string(),
        }),
    }
}

fn has_valid_scheme(url: &str) -> bool {
    url.split_once("://")
        .is_some_and(|(scheme, rest)| SCHEMES.contains(&scheme) && !rest.is_empty())
}

fn valid_alias(alias: &str) -> bool {
    !alias.is_empty() && !alias.contains("://") && !alias.contains(char::is_whitespace)
}

/// Expand every mapping of a property into targets.
///
/// Location-agnostic and child targets share the child remap file, so they
/// share one uniqueness namespace.
///
/// # Errors
///
/// Returns every [`RemapError::InvalidMapping`], [`RemapError::InvalidScheme`]
/// and [`RemapError::DuplicateMapping`] found in the property.
pub fn expand(spec: &PropertySpec) -> Result<Vec<Target>, Vec<RemapError>> {
    let property = spec.name.as_str();
    let mut errors = Vec::new();
    let mut targets = Vec::new();
    let mut seen: BTreeSet<(bool, String)> = BTreeSet::new();

    for (id, mapping) in spec.mappings.iter().enumerate() {
        let invalid = |reason: String| RemapError::InvalidMapping {
            property: property.to_string(),
            reason: format!("mapping #{id}: {reason}"),
        };

        if mapping.from.is_empty() {
            errors.push(invalid("no source aliases".to_string()));
        }
        for alias in mapping.from.iter().filter(|alias| !valid_alias(alias)) {
            errors.push(invalid(format!("invalid source alias '{alias}'")));
        }
        if !has_valid_scheme(&mapping.to) {
            errors.push(invalid(format!(
                "target '{}' must start with one of {}",
                mapping.to,
                SCHEMES
                    .iter()
                    .map(|s| format!("{s}://"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        for scheme in mapping.schemes.iter().filter(|s| !SCHEMES.contains(&s.as_str())) {
            errors.push(RemapError::InvalidScheme {
                property: property.to_string(),
                scheme: scheme.clone(),
            });
        }

        let options = mapping.merged_options(&spec.options);
        let locations = match locations(property, &options) {
            Ok(locations) => locations,
            Err(error) => {
                errors.push(error);
                continue;
            }
        };

        let from: Vec<String> = mapping
            .from
            .iter()
            .flat_map(|alias| {
                mapping
                    .schemes
                    .iter()
                    .map(move |scheme| format!("{scheme}://{alias}"))
            })
            .collect();

        for location in locations {
            for url in &from {
                if !seen.insert((location == Location::Parent, url.clone())) {
                    errors.push(RemapError::DuplicateMapping {
                        property: property.to_string(),
                        mapping: format!("{url} ({location})"),
                    });
                }
            }
            targets.push(Target {
                id,
                location,
                explicit: mapping.explicit,
                from: from.clone(),
                to: mapping.to.clone(),
                options: options.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(targets)
    } else {
        Err(errors)
    }
}
