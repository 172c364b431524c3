//! Helpers shared by the `compile` and `check` commands

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use crate::compiler::{CompiledProperty, Compiler};
use crate::core::{RemapError, user_friendly_error};
use crate::property::PropertySpec;

fn is_property_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

/// Expand files and directories into the property files they name.
///
/// Directories are searched recursively for `*.yaml` and `*.yml` files.
/// Explicit file arguments are taken as given, whatever their extension.
/// The result is sorted and free of duplicates.
///
/// # Errors
///
/// Returns an error if a path does not exist, a directory cannot be walked
/// or no property file is found.
pub fn collect_property_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(RemapError::FileSystemError {
                operation: "read property path".to_string(),
                path: path.display().to_string(),
            }
            .into());
        }
        for entry in WalkDir::new(path).follow_links(true) {
            let entry = entry
                .with_context(|| format!("Failed to walk directory: {}", path.display()))?;
            if entry.file_type().is_file() && is_property_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    if files.is_empty() {
        anyhow::bail!("No property files (*.yaml, *.yml) found");
    }
    debug!("Found {} property file(s)", files.len());
    Ok(files)
}

/// Load and compile every property file.
///
/// Every file is attempted. A single failure is returned as-is; with
/// several, each is printed to stderr and [`RemapError::CompileFailed`]
/// is returned.
///
/// # Errors
///
/// Returns an error if any file fails to load or compile, or if two files
/// define the same property name.
pub fn compile_files(compiler: &Compiler, files: &[PathBuf]) -> Result<Vec<CompiledProperty>> {
    let mut defined: BTreeMap<String, &Path> = BTreeMap::new();
    let mut compiled = Vec::with_capacity(files.len());
    let mut failures: Vec<anyhow::Error> = Vec::new();

    for file in files {
        let spec = match PropertySpec::load(file) {
            Ok(spec) => spec,
            Err(error) => {
                failures.push(error);
                continue;
            }
        };

        if let Some(previous) = defined.get(&spec.name) {
            failures.push(
                RemapError::PropertyParse {
                    file: file.display().to_string(),
                    reason: format!(
                        "property '{}' already defined in {}",
                        spec.name,
                        previous.display()
                    ),
                }
                .into(),
            );
            continue;
        }
        defined.insert(spec.name.clone(), file);

        match compiler.compile(&spec) {
            Ok(property) => compiled.push(property),
            Err(error) => failures.push(error.into()),
        }
    }

    match failures.len() {
        0 => Ok(compiled),
        1 => Err(failures.remove(0)),
        failed => {
            for failure in failures {
                user_friendly_error(failure).display();
            }
            Err(RemapError::CompileFailed {
                failed,
                total: files.len(),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Registry;

    const WWW: &str = "name: www\nmappings:\n  - {from: [www.example.com], to: 'http://origin'}\n";

    #[test]
    fn test_collects_yaml_recursively() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("a.yaml"), WWW).unwrap();
        std::fs::write(nested.join("c.yml"), WWW).unwrap();
        std::fs::write(temp.path().join("notes.txt"), "x").unwrap();

        let files =
            collect_property_files(&[temp.path().to_path_buf(), temp.path().join("a.yaml")])
                .unwrap();
        assert_eq!(files, vec![temp.path().join("a.yaml"), nested.join("c.yml")]);
    }

    #[test]
    fn test_missing_path_and_empty_directory() {
        let temp = tempfile::tempdir().unwrap();
        assert!(collect_property_files(&[temp.path().join("missing")]).is_err());
        assert!(collect_property_files(&[temp.path().to_path_buf()]).is_err());
    }

    #[test]
    fn test_duplicate_property_name_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("a.yaml");
        let second = temp.path().join("b.yaml");
        std::fs::write(&first, WWW).unwrap();
        std::fs::write(&second, WWW).unwrap();

        let compiler = Compiler::new(Registry::builtin());
        let error = compile_files(&compiler, &[first, second]).unwrap_err();
        assert!(error.to_string().contains("property 'www' already defined"));
    }

    #[test]
    fn test_several_failures_counted() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.yaml");
        let bad = temp.path().join("bad.yaml");
        let worse = temp.path().join("worse.yaml");
        std::fs::write(&good, WWW).unwrap();
        std::fs::write(&bad, "name: [").unwrap();
        std::fs::write(&worse, "name: x\nmappings:\n  - {from: [a], to: 'http://o', options: {bogus: 1}}\n")
            .unwrap();

        let compiler = Compiler::new(Registry::builtin());
        let error = compile_files(&compiler, &[good, bad, worse]).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<RemapError>(),
            Some(RemapError::CompileFailed { failed: 2, total: 3 })
        ));
    }
}
