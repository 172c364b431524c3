//! Core types for remapgen
//!
//! This module holds the error system shared by every layer of the compiler:
//!
//! - [`PluginError`] - plugin-level rendering failures
//! - [`ResolveError`] / [`ResolveErrors`] - collected failures of one
//!   resolution pass
//! - [`RemapError`] - top-level compiler failures
//! - [`ErrorContext`] / [`user_friendly_error`] - terminal presentation
//!
//! # Error Handling Pattern
//!
//! ```rust
//! use remapgen_cli::core::{RemapError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn compile() -> Result<()> {
//!     Err(RemapError::ConfigError { message: "bad output_dir".to_string() }.into())
//! }
//!
//! if let Err(e) = compile() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.to_string().contains("bad output_dir"));
//! }
//! ```

pub mod error;

pub use error::{
    ErrorContext, PluginError, RemapError, ResolveError, ResolveErrors, user_friendly_error,
};
