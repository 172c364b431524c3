//! Content rendering
//!
//! Turns one plugin's facets into directive text. The text format is a fixed
//! contract with the proxy and with the deployment-time role renderer, so
//! every byte matters:
//!
//! - tokens on one line are separated by a single space
//! - `@plugin=<library>` leads the plugin's directives
//! - formal parameters are written `@pparam=<token>`, raw ones as-is
//! - side files are referenced as `@pparam=<file>` or
//!   `@pparam=<switch>=<file>`
//! - role blocks use `{% if "<role>" in roles %}` ... `{% endif %}`
//!
//! A role-gated plugin's whole output (library reference included) is
//! wrapped in an if/else block whose else branch is empty:
//!
//! ```text
//! {% if "roles_debug" in roles %}
//! @plugin=xdebug.so @pparam=--enable=x-cache
//! {% else %}
//! {% endif %}
//! ```

use std::collections::BTreeMap;

use crate::core::PluginError;
use crate::plugin::{DEFAULT_ROLE, ParameterStyle, Plugin};

use super::environment::{Environment, Location};

/// Rendered output of one plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// Inline directive text for the rule line
    pub content: String,
    /// Side file body
    pub sub_config: String,
    /// Side file name, for plugins with a side file
    pub file_name: Option<String>,
}

/// The pieces [`render`] assembles; also consumed by compound merging.
#[derive(Debug, Clone, Default)]
pub(crate) struct Parts {
    pub library: Option<String>,
    pub body: String,
    pub sub_config: String,
    pub file_name: Option<String>,
}

/// Render a plugin for one environment.
pub fn render(plugin: &dyn Plugin, env: &Environment) -> Result<Rendered, PluginError> {
    let parts = render_parts(plugin, env)?;
    Ok(Rendered {
        content: assemble(plugin, parts.library.as_deref(), &parts.body),
        sub_config: parts.sub_config,
        file_name: parts.file_name,
    })
}

/// Render everything but the library reference and role guard.
///
/// Body precedence: role-varying parameters, flat parameters, side file
/// reference, raw content.
pub(crate) fn render_parts(plugin: &dyn Plugin, env: &Environment) -> Result<Parts, PluginError> {
    let library = plugin
        .as_shared_library()
        .map(|lib| lib.library().to_string());

    let (sub_config, file_name) = match plugin.as_sub_config() {
        Some(file) => (
            file.sub_config(env)?,
            Some(sub_config_file_name(file.file_name(), env)),
        ),
        None => (String::new(), None),
    };

    let body = if let Some(producer) = plugin.as_role_parameters() {
        render_role_parameters(&producer.role_parameters(env)?)
    } else if let Some(producer) = plugin.as_parameters() {
        render_parameters(&producer.parameters(env)?, producer.style())
    } else if let Some(name) = file_name.as_deref().filter(|_| !sub_config.is_empty()) {
        file_reference(plugin, name)
    } else if let Some(producer) = plugin.as_content() {
        producer.content(env)?
    } else {
        String::new()
    };

    Ok(Parts {
        library,
        body,
        sub_config,
        file_name,
    })
}

/// Prefix the library reference and apply the role guard.
///
/// An empty body renders nothing at all.
pub(crate) fn assemble(plugin: &dyn Plugin, library: Option<&str>, body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    if let Some(library) = library {
        out.push_str("@plugin=");
        out.push_str(library);
        out.push(if body.starts_with("{%") { '\n' } else { ' ' });
    }
    out.push_str(body);

    match plugin.as_role_gated() {
        Some(gated) => role_guard(gated.role(), &out),
        None => out,
    }
}

/// `if role then content else nothing`; the empty else keeps block balance.
#[must_use]
pub fn role_guard(role: &str, content: &str) -> String {
    format!("{{% if \"{role}\" in roles %}}\n{content}\n{{% else %}}\n{{% endif %}}")
}

/// Write tokens on one line, space separated.
#[must_use]
pub fn render_parameters(tokens: &[String], style: ParameterStyle) -> String {
    tokens
        .iter()
        .map(|token| match style {
            ParameterStyle::Formal => format!("@pparam={token}"),
            ParameterStyle::Raw => token.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Default-role tokens first, then one guarded block per role.
///
/// Roles come out in lexicographic order, blocks are separated by one blank
/// line, and the last block ends at its `{% endif %}` with nothing after it.
#[must_use]
pub fn render_role_parameters(roles: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = roles
        .get(DEFAULT_ROLE)
        .map(|tokens| render_parameters(tokens, ParameterStyle::Formal))
        .unwrap_or_default();

    let guarded = roles
        .iter()
        .filter(|(role, tokens)| role.as_str() != DEFAULT_ROLE && !tokens.is_empty());

    for (index, (role, tokens)) in guarded.enumerate() {
        if index > 0 {
            out.push_str("\n\n");
        } else if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("{{% if \"{role}\" in roles %}}\n"));
        out.push_str(&render_parameters(tokens, ParameterStyle::Formal));
        out.push_str("\n{% endif %}");
    }
    out
}

/// Reference to a plugin's side file
pub(crate) fn file_reference(plugin: &dyn Plugin, file_name: &str) -> String {
    match plugin.as_config_switch() {
        Some(switch) => format!("@pparam={}={file_name}", switch.switch()),
        None => format!("@pparam={file_name}"),
    }
}

/// Name of a plugin's side file for one environment.
///
/// `<property>_<stem>[_<id>][_parent].<ext>` where the id only appears for
/// mappings after the first, and the extension is `lua` when the declared
/// name ends in `.lua`, `config` otherwise.
#[must_use]
pub fn sub_config_file_name(declared: &str, env: &Environment) -> String {
    let (stem, extension) = match declared.strip_suffix(".lua") {
        Some(stem) => (stem, "lua"),
        None => (declared.strip_suffix(".config").unwrap_or(declared), "config"),
    };

    let mut name = format!("{}_{}", env.property, stem);
    if env.id > 0 {
        name.push_str(&format!("_{}", env.id));
    }
    if env.location == Location::Parent {
        name.push_str("_parent");
    }
    format!("{name}.{extension}")
}
