//! Configuration types for component catalogs.
//!
//! This module contains the strongly-typed structures that are deserialized
//! from the YAML files of a catalog directory.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{ComponentChange, ComponentGroup, ComponentTemplate};
use crate::models::{PayrollComponent, ValidationRules};

/// Metadata about the component catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetadata {
    /// The human-readable name of the catalog.
    pub name: String,
    /// The catalog version.
    pub version: String,
    /// ISO 4217 currency code of all amounts.
    pub currency: String,
    /// Where the component definitions come from.
    #[serde(default)]
    pub source: Option<String>,
}

/// The component definitions file.
///
/// Each entry is validated as it is read; an entry that cannot form a
/// valid component fails the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    /// The date the initial definitions take effect.
    pub effective_date: NaiveDate,
    /// The component definitions.
    pub components: Vec<PayrollComponent>,
    /// Named component groups.
    #[serde(default)]
    pub groups: Vec<ComponentGroup>,
    /// Component packages assigned to employees as a whole.
    #[serde(default)]
    pub templates: Vec<ComponentTemplate>,
}

/// One file of effective-dated component changes.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeFile {
    /// The date every change in the file takes effect.
    pub effective_date: NaiveDate,
    /// Who made the changes.
    pub changed_by: String,
    /// The changes.
    pub changes: Vec<ChangeEntry>,
}

/// A change applied to one or more components.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEntry {
    /// The components to change.
    pub components: Vec<String>,
    /// The new calculation value.
    #[serde(default)]
    pub calculation_value: Option<Decimal>,
    /// The new validation rules.
    #[serde(default)]
    pub validation_rules: Option<ValidationRules>,
    /// Why the change was made.
    #[serde(default)]
    pub note: Option<String>,
}

impl ChangeFile {
    /// Returns the changes as catalog changes, paired with their component ids.
    pub fn entries(&self) -> impl Iterator<Item = (&[String], ComponentChange)> + '_ {
        self.changes.iter().map(|entry| {
            let change = ComponentChange {
                effective_date: self.effective_date,
                changed_by: self.changed_by.clone(),
                calculation_value: entry.calculation_value,
                validation_rules: entry.validation_rules.clone(),
                note: entry.note.clone(),
            };
            (entry.components.as_slice(), change)
        })
    }
}
