//! The component catalog.
//!
//! A [`ComponentCatalog`] holds every component definition together with its
//! effective-dated history. The initial set is validated as a whole when the
//! catalog is built (unique ids, known dependencies, no cycles); later
//! changes append versions and never overwrite earlier ones, so a payroll
//! run for any past date sees the components as they were on that date.
//!
//! Every recorded change also leaves one [`AuditEntry`] per field it touched.
//! Components can be collected into [`ComponentGroup`]s for reporting and
//! into [`ComponentTemplate`]s that assign a whole package to an employee.
//!
//! # Example
//!
//! ```
//! use payroll_engine::catalog::{ComponentCatalog, ComponentChange};
//! use payroll_engine::models::{CalculationRule, ComponentType, PayrollComponent};
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! let launch = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
//! let transport = PayrollComponent::new(
//!     "transport",
//!     "Transport Allowance",
//!     ComponentType::Allowance,
//!     CalculationRule::Fixed { value: Decimal::from(300) },
//! );
//! let mut catalog = ComponentCatalog::new(launch, vec![transport]).unwrap();
//!
//! let raise = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
//! catalog
//!     .apply_change("transport", ComponentChange::new(raise, "hr_admin")
//!         .with_calculation_value(Decimal::from(350)))
//!     .unwrap();
//!
//! assert_eq!(catalog.history("transport").unwrap().len(), 2);
//! ```

mod audit;
mod group;
mod history;
mod report;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculation::resolve_order;
use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollComponent, TaxTreatment};
use crate::run::EvaluationPlan;

pub use audit::{AuditAction, AuditEntry};
pub use group::{AppliedTemplate, ComponentGroup, ComponentTemplate};
pub use history::{ComponentChange, ComponentVersion};
pub use report::CatalogReport;

/// The outcome of a bulk update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateResult {
    /// Number of components that received a new version.
    pub updated_count: usize,
}

/// Component definitions with their effective-dated history.
#[derive(Debug, Clone)]
pub struct ComponentCatalog {
    /// Component ids in definition order.
    ids: Vec<String>,
    /// Versions per component, oldest first.
    versions: HashMap<String, Vec<ComponentVersion>>,
    groups: BTreeMap<String, ComponentGroup>,
    templates: BTreeMap<String, ComponentTemplate>,
    /// Field-level change log, oldest first.
    audit: Vec<AuditEntry>,
}

impl ComponentCatalog {
    /// Builds a catalog whose components all take effect on `effective_date`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateComponent`, `UnknownDependency` or
    /// `CyclicDependency` if the set cannot be evaluated as a whole.
    pub fn new(
        effective_date: NaiveDate,
        components: Vec<PayrollComponent>,
    ) -> EngineResult<Self> {
        resolve_order(&components)?;

        let ids = components.iter().map(|c| c.id.clone()).collect();
        let versions = components
            .into_iter()
            .map(|component| {
                let version = ComponentVersion {
                    version: 1,
                    effective_date,
                    component,
                    changed_by: None,
                    note: None,
                };
                (version.component.id.clone(), vec![version])
            })
            .collect();

        Ok(Self {
            ids,
            versions,
            groups: BTreeMap::new(),
            templates: BTreeMap::new(),
            audit: Vec::new(),
        })
    }

    /// Returns the number of components.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns whether the catalog has no components.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the component ids in definition order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    fn versions(&self, component_id: &str) -> EngineResult<&[ComponentVersion]> {
        self.versions
            .get(component_id)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::ComponentNotFound {
                component_id: component_id.to_string(),
            })
    }

    fn latest(&self, component_id: &str) -> EngineResult<&ComponentVersion> {
        self.versions(component_id)?
            .last()
            .ok_or_else(|| EngineError::ComponentNotFound {
                component_id: component_id.to_string(),
            })
    }

    /// Returns the latest version of a component.
    pub fn get(&self, component_id: &str) -> EngineResult<&PayrollComponent> {
        self.latest(component_id).map(|version| &version.component)
    }

    /// Returns the latest version of every component, in definition order.
    pub fn components(&self) -> Vec<&PayrollComponent> {
        self.ids
            .iter()
            .filter_map(|id| self.get(id).ok())
            .collect()
    }

    /// Returns the version of a component in effect on `date`.
    ///
    /// When several versions share an effective date, the one recorded last
    /// wins.
    pub fn component_as_of(
        &self,
        component_id: &str,
        date: NaiveDate,
    ) -> EngineResult<&PayrollComponent> {
        self.versions(component_id)?
            .iter()
            .rev()
            .find(|version| version.effective_date <= date)
            .map(|version| &version.component)
            .ok_or_else(|| EngineError::ComponentNotFound {
                component_id: component_id.to_string(),
            })
    }

    /// Returns every component in effect on `date`, in definition order.
    pub fn snapshot_as_of(&self, date: NaiveDate) -> Vec<PayrollComponent> {
        self.ids
            .iter()
            .filter_map(|id| self.component_as_of(id, date).ok())
            .cloned()
            .collect()
    }

    /// Records a change to one component as a new version.
    ///
    /// # Errors
    ///
    /// - `ComponentNotFound` for an unknown id.
    /// - `InvalidComponent` if the change is empty, predates the current
    ///   version, or sets a calculation value on a formula component.
    pub fn apply_change(
        &mut self,
        component_id: &str,
        change: ComponentChange,
    ) -> EngineResult<&ComponentVersion> {
        let current = self.latest(component_id)?;
        let next = change.apply_to(current)?;
        let entries = audit::change_entries(&change, current, &next, AuditAction::Update);
        let versions = self
            .versions
            .get_mut(component_id)
            .ok_or_else(|| EngineError::ComponentNotFound {
                component_id: component_id.to_string(),
            })?;
        versions.push(next);
        self.audit.extend(entries);
        self.latest(component_id)
    }

    /// Applies the same change to several components.
    ///
    /// The update is all-or-nothing: if any id is unknown or any component
    /// rejects the change, no version is recorded. Repeated ids are updated
    /// once.
    pub fn bulk_apply<I, S>(
        &mut self,
        component_ids: I,
        change: &ComponentChange,
    ) -> EngineResult<BulkUpdateResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: BTreeSet<String> = component_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        let mut staged = Vec::with_capacity(ids.len());
        for id in &ids {
            let current = self.latest(id)?;
            let next = change.apply_to(current)?;
            let entries = audit::change_entries(change, current, &next, AuditAction::BulkUpdate);
            staged.push((next, entries));
        }

        let updated_count = staged.len();
        for (version, entries) in staged {
            if let Some(versions) = self.versions.get_mut(&version.component.id) {
                versions.push(version);
                self.audit.extend(entries);
            }
        }

        Ok(BulkUpdateResult { updated_count })
    }

    /// Returns every version of a component, newest first.
    pub fn history(&self, component_id: &str) -> EngineResult<Vec<&ComponentVersion>> {
        Ok(self.versions(component_id)?.iter().rev().collect())
    }

    /// Records an audit entry for a change made outside [`apply_change`].
    ///
    /// [`apply_change`]: ComponentCatalog::apply_change
    pub fn log_audit(&mut self, entry: AuditEntry) -> EngineResult<()> {
        self.versions(&entry.component_id)?;
        self.audit.push(entry);
        Ok(())
    }

    /// Returns the audit entries of a component, oldest first.
    pub fn audit_trail(&self, component_id: &str) -> EngineResult<Vec<&AuditEntry>> {
        self.versions(component_id)?;
        Ok(self
            .audit
            .iter()
            .filter(|entry| entry.component_id == component_id)
            .collect())
    }

    /// Registers a group.
    ///
    /// # Errors
    ///
    /// - `DuplicateComponentSet` if the group id is taken.
    /// - `ComponentNotFound` for an unknown member.
    /// - `DuplicateComponent` if a member is listed twice.
    pub fn create_group(&mut self, group: ComponentGroup) -> EngineResult<&ComponentGroup> {
        if self.groups.contains_key(&group.id) {
            return Err(duplicate_set("group", &group.id));
        }
        let mut seen = BTreeSet::new();
        for id in &group.components {
            self.versions(id)?;
            if !seen.insert(id.as_str()) {
                return Err(EngineError::DuplicateComponent {
                    component_id: id.clone(),
                });
            }
        }

        let id = group.id.clone();
        let group: &ComponentGroup = self.groups.entry(id).or_insert(group);
        Ok(group)
    }

    /// Returns a group.
    pub fn group(&self, group_id: &str) -> EngineResult<&ComponentGroup> {
        self.groups
            .get(group_id)
            .ok_or_else(|| set_not_found("group", group_id))
    }

    /// Returns every group, ordered by id.
    pub fn groups(&self) -> impl Iterator<Item = &ComponentGroup> {
        self.groups.values()
    }

    /// Returns the latest version of every member of a group, in group order.
    pub fn group_components(&self, group_id: &str) -> EngineResult<Vec<&PayrollComponent>> {
        self.group(group_id)?
            .components
            .iter()
            .map(|id| self.get(id))
            .collect()
    }

    /// Registers a template.
    ///
    /// # Errors
    ///
    /// - `DuplicateComponentSet` if the template id is taken.
    /// - `ComponentNotFound` for an unknown member.
    /// - `DuplicateComponent`, `UnknownDependency` or `CyclicDependency` if
    ///   the members cannot be evaluated on their own.
    pub fn create_template(
        &mut self,
        template: ComponentTemplate,
    ) -> EngineResult<&ComponentTemplate> {
        if self.templates.contains_key(&template.id) {
            return Err(duplicate_set("template", &template.id));
        }
        let members = template
            .components
            .iter()
            .map(|id| self.get(id).cloned())
            .collect::<EngineResult<Vec<_>>>()?;
        resolve_order(&members)?;

        let id = template.id.clone();
        let template: &ComponentTemplate = self.templates.entry(id).or_insert(template);
        Ok(template)
    }

    /// Returns a template.
    pub fn template(&self, template_id: &str) -> EngineResult<&ComponentTemplate> {
        self.templates
            .get(template_id)
            .ok_or_else(|| set_not_found("template", template_id))
    }

    /// Returns every template, ordered by id.
    pub fn templates(&self) -> impl Iterator<Item = &ComponentTemplate> {
        self.templates.values()
    }

    /// Assigns a template's components, as they are on `as_of`, to an
    /// employee.
    ///
    /// # Errors
    ///
    /// `ComponentSetNotFound` for an unknown template; `ComponentNotFound`
    /// if a member is not yet in effect on `as_of`.
    pub fn apply_template(
        &self,
        template_id: &str,
        employee_id: impl Into<String>,
        as_of: NaiveDate,
    ) -> EngineResult<AppliedTemplate> {
        let template = self.template(template_id)?;
        let components = template
            .components
            .iter()
            .map(|id| self.component_as_of(id, as_of).cloned())
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(AppliedTemplate {
            template_id: template.id.clone(),
            employee_id: employee_id.into(),
            effective_date: as_of,
            components,
        })
    }

    /// Returns the tax treatment of the latest version of a component.
    pub fn tax_treatment(&self, component_id: &str) -> EngineResult<&TaxTreatment> {
        self.get(component_id).map(|component| &component.tax)
    }

    /// Counts the latest versions by type and flag.
    pub fn report(&self) -> CatalogReport {
        CatalogReport::from_components(self.components())
    }

    /// Builds an evaluation plan over the latest version of every component.
    pub fn latest_plan(&self) -> EngineResult<EvaluationPlan> {
        EvaluationPlan::new(self.components().into_iter().cloned().collect())
    }

    /// Builds an evaluation plan over the components in effect on `date`.
    pub fn plan_as_of(&self, date: NaiveDate) -> EngineResult<EvaluationPlan> {
        EvaluationPlan::new(self.snapshot_as_of(date))
    }
}

fn set_not_found(kind: &str, set_id: &str) -> EngineError {
    EngineError::ComponentSetNotFound {
        kind: kind.to_string(),
        set_id: set_id.to_string(),
    }
}

fn duplicate_set(kind: &str, set_id: &str) -> EngineError {
    EngineError::DuplicateComponentSet {
        kind: kind.to_string(),
        set_id: set_id.to_string(),
    }
}
