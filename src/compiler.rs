//! Property compilation
//!
//! Drives the resolver over every target of a property. A property either
//! compiles completely or contributes nothing: all expansion and resolution
//! errors of the property are gathered into one
//! [`RemapError::PropertyFailed`].

use serde::Serialize;
use tracing::{debug, info};

use crate::core::RemapError;
use crate::plugin::Registry;
use crate::property::{PropertySpec, expand};
use crate::resolver::{Location, MappingRule, Resolver};

/// Resolved rules for one (mapping, location) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledTarget {
    pub id: usize,
    pub location: Location,
    /// Source URLs, `scheme://alias`
    pub from: Vec<String>,
    pub to: String,
    /// Rules in emission order
    pub rules: Vec<MappingRule>,
}

/// Every compiled target of one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledProperty {
    pub name: String,
    pub targets: Vec<CompiledTarget>,
}

/// Compiles property specifications against a registry
#[derive(Debug)]
pub struct Compiler {
    registry: Registry,
}

impl Compiler {
    #[must_use]
    pub const fn new(registry: Registry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Compile one property.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::PropertyFailed`] with every problem found.
    pub fn compile(&self, spec: &PropertySpec) -> Result<CompiledProperty, RemapError> {
        let fail = |errors: Vec<RemapError>| RemapError::PropertyFailed {
            property: spec.name.clone(),
            errors,
        };

        let targets = expand(spec).map_err(fail)?;
        let resolver = Resolver::new(&self.registry);

        let mut errors = Vec::new();
        let mut compiled = Vec::with_capacity(targets.len());
        for target in targets {
            let env = target.environment(&spec.name);
            match resolver.resolve(&target.options, &env, target.explicit) {
                Ok(rules) => {
                    debug!("{} {}: {} rule(s)", spec.name, target.label(), rules.len());
                    compiled.push(CompiledTarget {
                        id: target.id,
                        location: target.location,
                        from: target.from,
                        to: target.to,
                        rules,
                    });
                }
                Err(resolve_errors) => errors.push(RemapError::Resolution {
                    property: spec.name.clone(),
                    target: target.label(),
                    errors: resolve_errors,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(fail(errors));
        }

        info!("Compiled property '{}' ({} target(s))", spec.name, compiled.len());
        Ok(CompiledProperty {
            name: spec.name.clone(),
            targets: compiled,
        })
    }
}
