//! List registered plugins.
//!
//! Shows, for each plugin, the option names it claims and the facets that
//! shape its output. Plugins disabled in the configuration are listed as
//! such. JSON output is meant for tooling:
//!
//! ```bash
//! remapgen plugins --format json | jq '.[].options[]'
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::config::CompilerConfig;
use crate::plugin::{Plugin, PluginCategory, Registry, family_of, weight_of};
use crate::resolver::Location;

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
pub struct PluginsCommand {
    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct PluginInfo {
    #[serde(rename = "type")]
    plugin_type: &'static str,
    category: PluginCategory,
    weight: i32,
    options: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    family: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    library: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    disabled: bool,
}

impl PluginInfo {
    fn new(plugin: &dyn Plugin, disabled: bool) -> Self {
        let family = family_of(plugin);
        Self {
            plugin_type: plugin.plugin_type(),
            category: plugin.category(),
            weight: weight_of(plugin),
            options: plugin
                .config_names()
                .iter()
                .copied()
                .filter(|name| !name.is_empty())
                .collect(),
            family: (plugin.category() == PluginCategory::Compound).then_some(family),
            library: plugin.as_shared_library().map(|l| l.library().to_string()),
            file: plugin.as_sub_config().map(|s| s.file_name().to_string()),
            locations: plugin
                .as_location_restricted()
                .map(|r| r.locations().to_vec())
                .unwrap_or_default(),
            role: plugin.as_role_gated().map(|r| r.role().to_string()),
            disabled,
        }
    }
}

fn describe(registry: &Registry, config: &CompilerConfig) -> Vec<PluginInfo> {
    registry
        .iter()
        .iter()
        .map(|plugin| {
            let disabled = config
                .disabled_plugins
                .iter()
                .any(|name| name == plugin.plugin_type() || name == family_of(plugin.as_ref()));
            PluginInfo::new(plugin.as_ref(), disabled)
        })
        .collect()
}

impl PluginsCommand {
    pub fn execute(self, config: &CompilerConfig) -> Result<()> {
        let registry = config.registry()?;
        let plugins = describe(&registry, config);

        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&plugins)?);
            return Ok(());
        }

        for conflict in registry.conflicts() {
            eprintln!("{} {}", "⚠".yellow(), conflict);
        }

        for info in &plugins {
            let mut line = format!(
                "{} [{}, weight {}]",
                info.plugin_type.bold(),
                info.category,
                info.weight
            );
            if info.disabled {
                line.push_str(&format!(" {}", "disabled".red()));
            }
            println!("{line}");

            if !info.options.is_empty() {
                println!("    options: {}", info.options.join(", ").cyan());
            }
            if let Some(family) = info.family.filter(|f| *f != info.plugin_type) {
                println!("    family: {family}");
            }
            if let Some(library) = &info.library {
                println!("    library: {library}");
            }
            if let Some(file) = &info.file {
                println!("    file: <property>_{file}");
            }
            if !info.locations.is_empty() {
                let locations: Vec<String> =
                    info.locations.iter().map(ToString::to_string).collect();
                println!("    locations: {}", locations.join(", "));
            }
            if let Some(role) = &info.role {
                println!("    role: {role}");
            }
        }
        Ok(())
    }
}
