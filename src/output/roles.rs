//! Deployment-time rendering of role blocks.
//!
//! Compiled rule content may carry `{% if "<role>" in roles %}` blocks.
//! When the host's role set is known, the blocks are evaluated with Tera
//! and the result is folded back into one line of space-separated tokens.

use std::error::Error;

use tera::{Context as TeraContext, Tera};

use crate::core::RemapError;

/// Evaluates role blocks for one host role set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRenderer {
    roles: Vec<String>,
}

impl RoleRenderer {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Render `content` and fold it onto a single line.
    ///
    /// Content without role blocks is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::RoleRender`] when Tera rejects the content.
    pub fn render(&self, property: &str, content: &str) -> Result<String, RemapError> {
        if !content.contains("{%") {
            return Ok(content.to_string());
        }

        let mut context = TeraContext::new();
        context.insert("roles", &self.roles);

        let mut tera = Tera::default();
        let rendered = tera
            .render_str(content, &context)
            .map_err(|e| RemapError::RoleRender {
                property: property.to_string(),
                reason: tera_reason(&e),
            })?;

        Ok(rendered.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Innermost message of a Tera error chain
fn tera_reason(error: &tera::Error) -> String {
    let mut reason = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        reason = cause.to_string();
        source = cause.source();
    }
    reason
}
