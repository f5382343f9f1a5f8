//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading component
//! catalogs from YAML files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::ComponentCatalog;
use crate::error::{EngineError, EngineResult};

use super::types::{CatalogFile, ChangeFile, EngineMetadata};

/// Loads and provides access to a component catalog.
///
/// # Directory Structure
///
/// ```text
/// config/standard/
/// ├── engine.yaml         # Catalog metadata
/// ├── components.yaml     # Initial definitions, groups and templates
/// └── changes/            # Optional
///     └── 2026-07-01.yaml # Changes effective from this date
/// ```
///
/// Change files are applied in order of their `effective_date`.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/standard")?;
/// println!("Loaded {} components", loader.catalog().len());
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    metadata: EngineMetadata,
    catalog: ComponentCatalog,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// - `ConfigNotFound` if `engine.yaml` or `components.yaml` is missing.
    /// - `ConfigParseError` if a file is not valid YAML or a definition does
    ///   not form a valid component.
    /// - `DuplicateComponent`, `UnknownDependency` or `CyclicDependency` if
    ///   the definitions cannot be evaluated together.
    /// - Any error from registering a group or template.
    /// - Any error from applying a change file.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<EngineMetadata>(&path.join("engine.yaml"))?;
        let catalog_file = Self::load_yaml::<CatalogFile>(&path.join("components.yaml"))?;
        let mut catalog =
            ComponentCatalog::new(catalog_file.effective_date, catalog_file.components)?;
        for group in catalog_file.groups {
            catalog.create_group(group)?;
        }
        for template in catalog_file.templates {
            catalog.create_template(template)?;
        }

        for change_file in Self::load_changes(&path.join("changes"))? {
            for (component_ids, change) in change_file.entries() {
                catalog.bulk_apply(component_ids, &change)?;
            }
            debug!(
                effective_date = %change_file.effective_date,
                changes = change_file.changes.len(),
                "Applied component changes"
            );
        }

        Ok(Self { metadata, catalog })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every change file, sorted by effective date.
    fn load_changes(changes_dir: &Path) -> EngineResult<Vec<ChangeFile>> {
        if !changes_dir.exists() {
            return Ok(Vec::new());
        }

        let changes_dir_str = changes_dir.display().to_string();
        let entries = fs::read_dir(changes_dir).map_err(|_| EngineError::ConfigNotFound {
            path: changes_dir_str.clone(),
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: changes_dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = paths
            .iter()
            .map(|path| Self::load_yaml::<ChangeFile>(path))
            .collect::<EngineResult<Vec<_>>>()?;
        files.sort_by_key(|file| file.effective_date);
        Ok(files)
    }

    /// Returns the catalog metadata.
    pub fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    /// Returns the component catalog.
    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }
}
