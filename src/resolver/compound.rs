//! Compound family merging
//!
//! Plugins of one compound family share a single output: one rule, one
//! library reference and at most one side file. The family base (the plugin
//! whose type equals the family tag) renders first; members follow with the
//! receipt member always in front.
//!
//! Members come in two styles. Parameter-producing members contribute
//! `@pparam=` tokens; everything else contributes side file lines. The two
//! styles are exclusive in the final rule: as soon as any member produced
//! parameters, the family is written as a parameter list on the rule line
//! and the base's side file output is dropped.

use tracing::trace;

use crate::core::{PluginError, ResolveError};
use crate::plugin::{ParameterStyle, Plugin, RECEIPT, Registry, weight_of};

use super::environment::Environment;
use super::render::{self, Parts};
use super::rule::MappingRule;

/// Put the receipt member first, the rest by type tag.
pub fn order_members(members: &mut [&str]) {
    members.sort_by_key(|member| (*member != RECEIPT, *member));
}

enum MemberOutput {
    Parameters(String),
    Body(String),
}

/// Merge the pending members of `family` into one rule.
///
/// Every member failure is collected; any failure means no rule.
pub fn merge_family(
    registry: &Registry,
    family: &str,
    members: &[&str],
    env: &Environment,
) -> Result<MappingRule, Vec<ResolveError>> {
    let Some(base) = registry.plugin(family) else {
        return Err(vec![ResolveError::UnresolvableHandler {
            plugin_type: family.to_string(),
        }]);
    };

    let mut errors = Vec::new();
    let base_parts = match render::render_parts(base.as_ref(), env) {
        Ok(parts) => parts,
        Err(source) => {
            errors.push(ResolveError::Render {
                plugin_type: family.to_string(),
                source,
            });
            Parts::default()
        }
    };

    let mut ordered: Vec<&str> = members
        .iter()
        .copied()
        .filter(|member| *member != family)
        .collect();
    order_members(&mut ordered);

    let mut parameters: Vec<String> = Vec::new();
    let mut bodies: Vec<String> = Vec::new();
    for member_type in ordered {
        let Some(member) = registry.plugin(member_type) else {
            errors.push(ResolveError::UnresolvableHandler {
                plugin_type: member_type.to_string(),
            });
            continue;
        };
        match render_member(member.as_ref(), env) {
            Ok(MemberOutput::Parameters(tokens)) if !tokens.is_empty() => parameters.push(tokens),
            Ok(MemberOutput::Body(body)) if !body.is_empty() => bodies.push(body),
            Ok(_) => trace!("Member '{}' of '{}' rendered nothing", member_type, family),
            Err(source) => errors.push(ResolveError::CompoundMember {
                family: family.to_string(),
                member: member_type.to_string(),
                source,
            }),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let file_backed = base.as_sub_config().is_some();
    let rule = MappingRule::new(base.plugin_type(), weight_of(base.as_ref()));

    if !parameters.is_empty() {
        let mut body = if file_backed {
            String::new()
        } else {
            base_parts.body
        };
        push_separated(&mut body, &parameters.join(" "), ' ');
        let content = render::assemble(base.as_ref(), base_parts.library.as_deref(), &body);
        return Ok(rule.with_content(content));
    }

    if file_backed {
        let mut sub_config = base_parts.sub_config;
        for body in &bodies {
            push_separated(&mut sub_config, body, '\n');
        }
        let body = match base_parts.file_name.as_deref() {
            Some(name) if !sub_config.is_empty() => render::file_reference(base.as_ref(), name),
            _ => String::new(),
        };
        let content = render::assemble(base.as_ref(), base_parts.library.as_deref(), &body);
        Ok(rule
            .with_content(content)
            .with_sub_config(sub_config, base_parts.file_name))
    } else {
        let mut body = base_parts.body;
        for member_body in &bodies {
            push_separated(&mut body, member_body, ' ');
        }
        let content = render::assemble(base.as_ref(), base_parts.library.as_deref(), &body);
        Ok(rule.with_content(content))
    }
}

fn render_member(member: &dyn Plugin, env: &Environment) -> Result<MemberOutput, PluginError> {
    if let Some(producer) = member.as_parameters() {
        let tokens = producer.parameters(env)?;
        return Ok(MemberOutput::Parameters(render::render_parameters(
            &tokens,
            ParameterStyle::Formal,
        )));
    }
    let body = if let Some(file) = member.as_sub_config() {
        file.sub_config(env)?
    } else if let Some(producer) = member.as_content() {
        producer.content(env)?
    } else {
        String::new()
    };
    Ok(MemberOutput::Body(body))
}

fn push_separated(buffer: &mut String, text: &str, separator: char) {
    if text.is_empty() {
        return;
    }
    if !buffer.is_empty() {
        buffer.push(separator);
    }
    buffer.push_str(text);
}
