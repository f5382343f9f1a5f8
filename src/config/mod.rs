//! Configuration loading for the payroll engine.
//!
//! This module loads a component catalog from a directory of YAML files:
//! catalog metadata, the initial component definitions, and effective-dated
//! change files that become component versions.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/standard").unwrap();
//! println!("Loaded catalog: {}", config.metadata().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{CatalogFile, ChangeEntry, ChangeFile, EngineMetadata};
