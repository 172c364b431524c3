//! remapgen entry point
//!
//! Parses arguments, runs the selected command and reports failures with
//! suggestions on stderr.
//!
//! - `compile` - Write remap files and side files for property files
//! - `check` - Compile property files without writing
//! - `plugins` - List registered plugins

use anyhow::Result;
use clap::Parser;
use remapgen_cli::cli;
use remapgen_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
