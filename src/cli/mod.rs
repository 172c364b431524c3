//! Command-line interface for remapgen.
//!
//! # Available Commands
//!
//! - `compile` - Compile property files and write remap files and side files
//! - `check` - Compile property files without writing anything
//! - `plugins` - List the registered plugins and the options they own
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - Errors only
//! - `--config` / `-c` - Compiler configuration file (also `REMAPGEN_CONFIG`)
//!
//! `RUST_LOG` overrides the log level chosen by `--verbose` / `--quiet`.
//!
//! # Examples
//!
//! ```bash
//! remapgen compile properties/ -o build/remap
//! remapgen compile www.yaml --roles roles_debug
//! remapgen check properties/
//! remapgen plugins --format json
//! ```

mod check;
pub mod common;
mod compile;
mod plugins;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::CompilerConfig;

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests and programmatic callers can run
/// commands without touching process-wide state.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,

    /// Explicit compiler configuration file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Install the stderr log subscriber. Later calls are no-ops.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level.as_deref().unwrap_or("off"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Compiler configuration following the lookup order
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn compiler_config(&self) -> Result<CompilerConfig> {
        CompilerConfig::load(self.config_path.as_deref())
    }
}

/// Compile declarative proxy policy into remap directives
#[derive(Parser)]
#[command(name = "remapgen", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the compiler configuration file
    #[arg(short, long, global = true, env = "REMAPGEN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile property files and write the results
    Compile(compile::CompileCommand),

    /// Compile property files and report errors without writing
    Check(check::CheckCommand),

    /// List registered plugins
    Plugins(plugins::PluginsCommand),
}

impl Cli {
    /// Run the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's error for the caller to report.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command with an explicit runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns the command's error for the caller to report.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let compiler_config = config.compiler_config()?;

        match self.command {
            Commands::Compile(cmd) => cmd.execute(compiler_config).await,
            Commands::Check(cmd) => cmd.execute(&compiler_config),
            Commands::Plugins(cmd) => cmd.execute(&compiler_config),
        }
    }
}
