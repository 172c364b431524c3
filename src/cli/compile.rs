//! Compile property files into remap files and side files.
//!
//! ```bash
//! remapgen compile properties/
//! remapgen compile www.yaml api.yaml -o build/remap
//! remapgen compile properties/ --roles roles_debug,roles_small
//! ```
//!
//! Nothing is written unless every property compiles.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{collect_property_files, compile_files};
use crate::compiler::Compiler;
use crate::config::CompilerConfig;
use crate::output::{RemapWriter, RoleRenderer};

#[derive(Args)]
pub struct CompileCommand {
    /// Property files or directories of property files
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Output directory (overrides `output_dir` from the configuration)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Host roles to render role blocks for, comma separated
    ///
    /// Without roles the blocks stay in the output for rendering at
    /// deployment time.
    #[arg(long, value_delimiter = ',', value_name = "ROLES")]
    roles: Vec<String>,
}

impl CompileCommand {
    pub async fn execute(self, config: CompilerConfig) -> Result<()> {
        let compiler = Compiler::new(config.registry()?);
        let files = collect_property_files(&self.paths)?;
        let properties = compile_files(&compiler, &files)?;

        let mut writer = RemapWriter::new(&config);
        if !self.roles.is_empty() {
            writer = writer.with_roles(RoleRenderer::new(self.roles));
        }

        let output_dir = self.output.unwrap_or(config.output_dir);
        let written = writer.write_all(&properties, &output_dir).await?;

        println!(
            "{} Compiled {} propert{} into {} file(s) in {}",
            "✓".green(),
            properties.len(),
            if properties.len() == 1 { "y" } else { "ies" },
            written.len(),
            output_dir.display()
        );
        Ok(())
    }
}
