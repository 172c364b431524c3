//! Compile property files without writing output.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{collect_property_files, compile_files};
use crate::compiler::Compiler;
use crate::config::CompilerConfig;

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per property
    Text,
    /// Compiled properties with their resolved rules
    Json,
}

#[derive(Args)]
pub struct CheckCommand {
    /// Property files or directories of property files
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl CheckCommand {
    pub fn execute(self, config: &CompilerConfig) -> Result<()> {
        let compiler = Compiler::new(config.registry()?);
        let files = collect_property_files(&self.paths)?;
        let properties = compile_files(&compiler, &files)?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&properties)?);
            }
            OutputFormat::Text => {
                for property in &properties {
                    let rules: usize = property.targets.iter().map(|t| t.rules.len()).sum();
                    println!(
                        "{} {} ({} target(s), {} rule(s))",
                        "✓".green(),
                        property.name.bold(),
                        property.targets.len(),
                        rules
                    );
                }
            }
        }
        Ok(())
    }
}
