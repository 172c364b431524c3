//! Error handling for remapgen
//!
//! This module provides the error types used across the compiler and the
//! user-friendly reporting layer used by the CLI. The error system has three
//! levels:
//!
//! 1. [`PluginError`] - raised by an individual plugin while turning its
//!    options into directive text (bad value shape, invalid regex, ...)
//! 2. [`ResolveError`] / [`ResolveErrors`] - raised by one resolution pass.
//!    A pass never fails fast: every problem is collected and the whole
//!    aggregate is returned instead of a partial rule list.
//! 3. [`RemapError`] - top-level failures (property parsing, mapping
//!    validation, configuration, resolution of a whole property).
//!
//! Use [`user_friendly_error`] to turn any `anyhow::Error` into an
//! [`ErrorContext`] with suggestions for the terminal.
//!
//! # Examples
//!
//! ```rust,no_run
//! use remapgen_cli::core::{ErrorContext, RemapError};
//!
//! let context = ErrorContext::new(RemapError::InvalidScheme {
//!     property: "www".to_string(),
//!     scheme: "gopher".to_string(),
//! })
//! .with_suggestion("Use one of: http, https, ws, wss");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Failure raised by a plugin while rendering its options.
///
/// The engine treats plugins opaquely, so these errors only describe the
/// structural expectations a plugin has on its option values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The option value does not have the shape the plugin needs
    #[error("option '{option}' expects {expected}")]
    InvalidValue {
        /// The declarative option name
        option: String,
        /// Human readable description of the expected shape
        expected: String,
    },

    /// A regular expression in the option value does not compile
    #[error("option '{option}' contains an invalid regular expression '{pattern}': {reason}")]
    InvalidRegex {
        /// The declarative option name
        option: String,
        /// The offending pattern
        pattern: String,
        /// Compiler message from the regex engine
        reason: String,
    },

    /// An address, range or network in the option value does not parse
    #[error("option '{option}' contains an invalid address or range '{value}'")]
    InvalidAddress {
        /// The declarative option name
        option: String,
        /// The offending value
        value: String,
    },

    /// A required nested key is missing from the option value
    #[error("option '{option}' is missing required key '{key}'")]
    MissingKey {
        /// The declarative option name
        option: String,
        /// The nested key that was expected
        key: String,
    },
}

/// One problem found during a resolution pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Declarative key with no owning plugin that is not a meta-option
    #[error("unknown configuration option '{name}'{}", did_you_mean(.suggestion))]
    UnknownOption {
        /// The option name as written by the operator
        name: String,
        /// Closest registered option name, if any is similar enough
        suggestion: Option<String>,
    },

    /// An option maps to a type tag that has no registered plugin.
    ///
    /// This is an internal consistency failure of the registry, not an
    /// operator mistake.
    #[error("no plugin registered for type '{plugin_type}'")]
    UnresolvableHandler {
        /// The dangling type tag
        plugin_type: String,
    },

    /// A plugin failed to render its output
    #[error("plugin '{plugin_type}' failed: {source}")]
    Render {
        /// Type tag of the failing plugin
        plugin_type: String,
        /// The plugin's own error
        #[source]
        source: PluginError,
    },

    /// A member of a compound family failed to render
    #[error("plugin '{member}' (family '{family}') failed: {source}")]
    CompoundMember {
        /// Family tag of the compound group
        family: String,
        /// Type tag of the failing member
        member: String,
        /// The member's own error
        #[source]
        source: PluginError,
    },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

/// Every error collected during one resolution pass.
///
/// A pass that produced at least one error returns this aggregate instead
/// of any rules. The collection is never empty when returned by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveErrors(Vec<ResolveError>);

impl ResolveErrors {
    /// Wrap a list of collected errors
    #[must_use]
    pub fn new(errors: Vec<ResolveError>) -> Self {
        Self(errors)
    }

    /// Number of collected errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the aggregate is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the collected errors in the order they were found
    pub fn iter(&self) -> std::slice::Iter<'_, ResolveError> {
        self.0.iter()
    }

    /// Names of every unknown option in this aggregate
    #[must_use]
    pub fn unknown_options(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter_map(|e| match e {
                ResolveError::UnknownOption { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for ResolveErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            errors => {
                write!(f, "{} errors:", errors.len())?;
                for error in errors {
                    write!(f, "\n  - {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ResolveErrors {}

impl IntoIterator for ResolveErrors {
    type Item = ResolveError;
    type IntoIter = std::vec::IntoIter<ResolveError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResolveErrors {
    type Item = &'a ResolveError;
    type IntoIter = std::slice::Iter<'a, ResolveError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The main error type for remapgen operations
///
/// # Error Categories
///
/// ## Input
/// - [`PropertyParse`] - a property file is not valid YAML or misses fields
/// - [`InvalidMapping`] - a mapping is structurally wrong
/// - [`InvalidScheme`] - a mapping uses a scheme the proxy does not serve
/// - [`DuplicateMapping`] - two mappings claim the same scheme/alias/location
///
/// ## Compilation
/// - [`Resolution`] - a (mapping, location) pass failed; carries every error
/// - [`PropertyFailed`] - a property collected one or more errors
/// - [`CompileFailed`] - several properties failed in one invocation
///
/// ## Output
/// - [`RoleRender`] - role blocks failed to render for the requested roles
///
/// ## Environment
/// - [`ConfigError`] - the compiler configuration file is invalid
/// - [`FileSystemError`] - reading inputs or writing outputs failed
///
/// [`PropertyParse`]: RemapError::PropertyParse
/// [`InvalidMapping`]: RemapError::InvalidMapping
/// [`InvalidScheme`]: RemapError::InvalidScheme
/// [`DuplicateMapping`]: RemapError::DuplicateMapping
/// [`Resolution`]: RemapError::Resolution
/// [`PropertyFailed`]: RemapError::PropertyFailed
/// [`CompileFailed`]: RemapError::CompileFailed
/// [`RoleRender`]: RemapError::RoleRender
/// [`ConfigError`]: RemapError::ConfigError
/// [`FileSystemError`]: RemapError::FileSystemError
#[derive(Error, Debug, Clone)]
pub enum RemapError {
    /// Property file parsing error
    #[error("Invalid property file {file}: {reason}")]
    PropertyParse {
        /// Path of the property file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A mapping is structurally invalid
    #[error("Invalid mapping in property '{property}': {reason}")]
    InvalidMapping {
        /// Property name
        property: String,
        /// What is wrong with the mapping
        reason: String,
    },

    /// A mapping uses an unsupported scheme
    #[error("Unsupported scheme '{scheme}' in property '{property}'")]
    InvalidScheme {
        /// Property name
        property: String,
        /// The rejected scheme
        scheme: String,
    },

    /// Two mappings claim the same source URL at the same location
    #[error("Duplicate mapping '{mapping}' in property '{property}'")]
    DuplicateMapping {
        /// Property name
        property: String,
        /// The duplicated `scheme://alias (location)` key
        mapping: String,
    },

    /// A resolution pass failed
    #[error("Cannot compile property '{property}' ({target}): {errors}")]
    Resolution {
        /// Property name
        property: String,
        /// Human readable mapping target (`mapping #N, location`)
        target: String,
        /// Every error of the pass
        errors: ResolveErrors,
    },

    /// A property collected one or more errors and produced no output
    #[error("Property '{property}' failed with {} error(s):{}", .errors.len(), bullet_list(.errors))]
    PropertyFailed {
        /// Property name
        property: String,
        /// Every error found while compiling the property
        errors: Vec<RemapError>,
    },

    /// Several property files failed; each was reported on its own
    #[error("{failed} of {total} property file(s) failed to compile")]
    CompileFailed {
        /// Number of failed property files
        failed: usize,
        /// Number of property files given
        total: usize,
    },

    /// Role blocks could not be rendered for a host role set
    #[error("Cannot render role blocks for property '{property}': {reason}")]
    RoleRender {
        /// Property name
        property: String,
        /// Template engine message
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// File system error
    #[error("File system error: {operation} {path}")]
    FileSystemError {
        /// The file system operation that failed
        operation: String,
        /// Path where the error occurred
        path: String,
    },
}

fn bullet_list(errors: &[RemapError]) -> String {
    errors.iter().map(|e| format!("\n  - {e}")).collect()
}

/// Error wrapper with user-facing suggestion and details
///
/// Mirrors what the CLI prints: the error in red, details in yellow and a
/// suggestion in green.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: RemapError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details
    #[must_use]
    pub const fn new(error: RemapError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with suggestions
///
/// Walks the error chain looking for a [`RemapError`]; I/O and YAML errors
/// are mapped onto the closest variant. Anything else becomes a generic
/// configuration error carrying the full `anyhow` chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(remap_error) = cause.downcast_ref::<RemapError>() {
            return create_error_context(remap_error.clone());
        }
    }

    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            let context = ErrorContext::new(RemapError::FileSystemError {
                operation: "file access".to_string(),
                path: error.to_string(),
            });
            return match io_error.kind() {
                std::io::ErrorKind::NotFound => context
                    .with_suggestion("Check that the property file or directory exists"),
                std::io::ErrorKind::PermissionDenied => context
                    .with_suggestion("Check permissions of the output directory"),
                _ => context,
            };
        }
        if let Some(yaml_error) = cause.downcast_ref::<serde_yaml::Error>() {
            return ErrorContext::new(RemapError::PropertyParse {
                file: error.to_string(),
                reason: yaml_error.to_string(),
            })
            .with_suggestion("Check the YAML syntax: indentation, quoting and list markers");
        }
    }

    ErrorContext::new(RemapError::ConfigError {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: RemapError) -> ErrorContext {
    match &error {
        RemapError::InvalidScheme { .. } => {
            ErrorContext::new(error).with_suggestion("Use one of: http, https, ws, wss")
        }
        RemapError::DuplicateMapping { .. } => ErrorContext::new(error)
            .with_suggestion("Remove the duplicate alias or give one mapping a different location")
            .with_details("Every scheme://alias pair may be mapped only once per location"),
        RemapError::Resolution { .. } | RemapError::PropertyFailed { .. }
            if has_unknown_option(&error) =>
        {
            ErrorContext::new(error)
                .with_suggestion("Run 'remapgen plugins' to list every supported option")
        }
        RemapError::PropertyParse { .. } => ErrorContext::new(error)
            .with_suggestion("Check the YAML syntax: indentation, quoting and list markers"),
        RemapError::CompileFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the errors listed above and run the command again"),
        RemapError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Check remapgen.toml or the file passed with --config"),
        _ => ErrorContext::new(error),
    }
}

fn has_unknown_option(error: &RemapError) -> bool {
    match error {
        RemapError::Resolution { errors, .. } => !errors.unknown_options().is_empty(),
        RemapError::PropertyFailed { errors, .. } => errors.iter().any(has_unknown_option),
        _ => false,
    }
}
