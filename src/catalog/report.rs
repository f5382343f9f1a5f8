//! Catalog reporting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ComponentType, PayrollComponent};

/// Counts over the current version of every component in a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReport {
    /// Number of components.
    pub total: usize,
    /// Number of components of each type.
    pub by_type: BTreeMap<ComponentType, usize>,
    /// Number of prorated components.
    pub prorated: usize,
    /// Number of taxable components.
    pub taxable: usize,
    /// Number of components whose amounts may need approval.
    pub approval_gated: usize,
}

impl CatalogReport {
    /// Builds the report from a set of components.
    pub fn from_components<'a>(components: impl IntoIterator<Item = &'a PayrollComponent>) -> Self {
        let mut report = CatalogReport::default();
        for component in components {
            report.total += 1;
            *report.by_type.entry(component.component_type).or_insert(0) += 1;
            if component.is_prorated {
                report.prorated += 1;
            }
            if component.tax.is_taxable {
                report.taxable += 1;
            }
            if component
                .validation_rules
                .as_ref()
                .is_some_and(|rules| rules.requires_approval)
            {
                report.approval_gated += 1;
            }
        }
        report
    }

    /// Returns the number of components of a type.
    pub fn count(&self, component_type: ComponentType) -> usize {
        self.by_type.get(&component_type).copied().unwrap_or(0)
    }
}
