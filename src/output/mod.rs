//! Output assembly
//!
//! Turns compiled properties into the files the proxy loads:
//!
//! - the remap file, holding child and location-agnostic targets;
//! - the parent remap file, holding parent targets;
//! - one side file per rule that carries a side file name.
//!
//! Each target yields one `map` line per source URL:
//!
//! ```text
//! map http://www.example.com http://origin.example.com @plugin=compress.so @pparam=www_compress.config
//! ```
//!
//! Rule content is appended in resolved order and every `map` entry is a
//! single line. Without a role set the content keeps its role blocks for
//! rendering at deployment time, folded onto the entry's line; with one,
//! [`RoleRenderer`] evaluates the blocks and every line is final.

mod roles;

pub use roles::RoleRenderer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::compiler::{CompiledProperty, CompiledTarget};
use crate::config::CompilerConfig;
use crate::core::RemapError;
use crate::resolver::Location;

/// A file to write, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Which remap file a target belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapTier {
    /// Child and location-agnostic targets
    Child,
    /// Parent targets
    Parent,
}

impl RemapTier {
    #[must_use]
    pub fn of(location: Location) -> Self {
        match location {
            Location::Parent => Self::Parent,
            Location::Child | Location::Unspecified => Self::Child,
        }
    }
}

/// Assembles remap files and side files
#[derive(Debug, Clone)]
pub struct RemapWriter {
    remap_file: String,
    parent_remap_file: String,
    roles: Option<RoleRenderer>,
}

impl RemapWriter {
    /// Writer using the file names and role set of `config`
    #[must_use]
    pub fn new(config: &CompilerConfig) -> Self {
        let roles = (!config.roles.is_empty()).then(|| RoleRenderer::new(config.roles.clone()));
        Self {
            remap_file: config.remap_file.clone(),
            parent_remap_file: config.parent_remap_file.clone(),
            roles,
        }
    }

    /// Render role blocks for this host role set
    #[must_use]
    pub fn with_roles(mut self, roles: RoleRenderer) -> Self {
        self.roles = Some(roles);
        self
    }

    fn map_lines(
        &self,
        property: &str,
        target: &CompiledTarget,
    ) -> Result<Vec<String>, RemapError> {
        let mut tokens = Vec::with_capacity(target.rules.len());
        for content in target.rules.iter().filter_map(|rule| rule.content.as_deref()) {
            let content = match &self.roles {
                Some(renderer) => renderer.render(property, content)?,
                None => fold_lines(content),
            };
            if !content.is_empty() {
                tokens.push(content);
            }
        }

        Ok(target
            .from
            .iter()
            .map(|from| {
                let mut line = format!("map {from} {}", target.to);
                for token in &tokens {
                    line.push(' ');
                    line.push_str(token);
                }
                line
            })
            .collect())
    }

    /// Text of one remap file.
    ///
    /// Properties are separated by a blank line and introduced by a comment
    /// naming them; properties without targets in `tier` are left out.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::RoleRender`] if role blocks fail to render.
    pub fn render_remap(
        &self,
        properties: &[CompiledProperty],
        tier: RemapTier,
    ) -> Result<String, RemapError> {
        let mut sections = Vec::new();
        for property in properties {
            let mut lines = Vec::new();
            for target in property
                .targets
                .iter()
                .filter(|target| RemapTier::of(target.location) == tier)
            {
                lines.extend(self.map_lines(&property.name, target)?);
            }
            if !lines.is_empty() {
                sections.push(format!("# property: {}\n{}", property.name, lines.join("\n")));
            }
        }

        let mut text = sections.join("\n\n");
        if !text.is_empty() {
            text.push('\n');
        }
        Ok(text)
    }

    /// Every side file, in property and target order
    #[must_use]
    pub fn side_files(&self, properties: &[CompiledProperty]) -> Vec<OutputFile> {
        properties
            .iter()
            .flat_map(|property| &property.targets)
            .flat_map(|target| &target.rules)
            .filter_map(|rule| match (&rule.sub_config_name, &rule.sub_config) {
                (Some(name), Some(body)) => Some(OutputFile {
                    path: PathBuf::from(name),
                    contents: format!("{body}\n"),
                }),
                _ => None,
            })
            .collect()
    }

    /// Both remap files followed by every side file.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::RoleRender`] if role blocks fail to render, or
    /// [`RemapError::ConfigError`] if two outputs claim the same file name.
    pub fn files(&self, properties: &[CompiledProperty]) -> Result<Vec<OutputFile>, RemapError> {
        let mut files = vec![
            OutputFile {
                path: PathBuf::from(&self.remap_file),
                contents: self.render_remap(properties, RemapTier::Child)?,
            },
            OutputFile {
                path: PathBuf::from(&self.parent_remap_file),
                contents: self.render_remap(properties, RemapTier::Parent)?,
            },
        ];
        files.extend(self.side_files(properties));

        let mut names: Vec<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(RemapError::ConfigError {
                message: format!("output file '{}' would be written twice", pair[0].display()),
            });
        }
        Ok(files)
    }

    /// Write every output file under `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if outputs cannot be assembled or written.
    pub async fn write_all(
        &self,
        properties: &[CompiledProperty],
        dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let files = self.files(properties)?;

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            let path = dir.join(&file.path);
            tokio::fs::write(&path, &file.contents)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        info!("Wrote {} file(s) to {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Join the lines of unrendered content so role blocks stay on one `map` line.
fn fold_lines(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
