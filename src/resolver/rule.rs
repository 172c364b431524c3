//! The engine's output unit.

use serde::Serialize;

use crate::plugin::DEFAULT_WEIGHT;

/// One resolved, orderable unit of output.
///
/// `content` is injected into the enclosing remap rule line; `sub_config` is
/// written to the side file named by `sub_config_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRule {
    pub plugin_type: String,
    pub weight: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_config_name: Option<String>,
}

impl MappingRule {
    pub fn new(plugin_type: impl Into<String>, weight: i32) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            weight,
            content: None,
            sub_config: None,
            sub_config_name: None,
        }
    }

    /// Set the inline content; empty text leaves it unset
    #[must_use]
    pub fn with_content(mut self, content: String) -> Self {
        self.content = non_empty(content);
        self
    }

    /// Set the side file body and its name; an empty body sets neither
    #[must_use]
    pub fn with_sub_config(mut self, body: String, name: Option<String>) -> Self {
        self.sub_config = non_empty(body);
        self.sub_config_name = self.sub_config.as_ref().and(name);
        self
    }

    /// Whether the rule carries any output. Rules without it are never emitted.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
            || self.sub_config.as_deref().is_some_and(|c| !c.is_empty())
    }
}

impl Default for MappingRule {
    fn default() -> Self {
        Self::new(String::new(), DEFAULT_WEIGHT)
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
