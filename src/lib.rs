//! remapgen - compile declarative proxy policy into remap directives
//!
//! A property file describes one site: the aliases it serves, the origin it
//! maps to and a set of declarative options (`allow_ip`, `compress`,
//! `set_headers`, ...). remapgen resolves every option to the plugin that
//! owns it and compiles the result into Apache Traffic Server remap lines
//! plus the side configuration files those lines reference.
//!
//! # Pipeline
//!
//! 1. [`property`] parses a property file and expands each mapping into one
//!    target per proxy tier (child, parent or location-agnostic).
//! 2. [`resolver`] walks a target's options, asks each owning
//!    [`plugin`] for its output and composes [`resolver::MappingRule`]s,
//!    merging compound families such as `header_rewrite` into one rule.
//! 3. [`compiler`] runs the resolver over every target of a property and
//!    gathers every error before giving up on the property.
//! 4. [`output`] turns compiled properties into `remap.config`,
//!    `parent_remap.config` and side files, optionally evaluating role
//!    blocks for a host role set.
//!
//! # Example property
//!
//! ```yaml
//! name: www
//! options:
//!   parent_child: true
//!   receipt: true
//! mappings:
//!   - from: [www.example.com]
//!     to: http://origin.example.com
//!     schemes: [http, https]
//!     options:
//!       allow_ip: [10.0.0.0-10.255.255.255]
//!       compress: true
//! ```
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface
//! - [`config`] - Compiler configuration (`remapgen.toml`)
//! - [`core`] - Error types and user-facing error reporting
//! - [`plugin`] - Plugin facets, the registry and built-in plugins

pub mod cli;
pub mod compiler;
pub mod config;
pub mod core;
pub mod output;
pub mod plugin;
pub mod property;
pub mod resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
