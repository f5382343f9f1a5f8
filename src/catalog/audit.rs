//! Field-level audit trail of component changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::history::{ComponentChange, ComponentVersion};

/// What kind of change an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A change to a single component.
    Update,
    /// One component's share of a bulk update.
    BulkUpdate,
}

/// One field of one component changing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The component changed.
    pub component_id: String,
    /// How the change was made.
    pub action: AuditAction,
    /// The field changed (e.g. "calculation_value").
    pub field: String,
    /// The value before the change, if the field had one.
    pub old_value: Option<Value>,
    /// The value after the change.
    pub new_value: Option<Value>,
    /// Who made the change.
    pub user: String,
    /// The component version the change produced, when it produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// The date the change takes effect, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
}

impl AuditEntry {
    /// Creates an entry for a change recorded outside the catalog's own
    /// versioning.
    pub fn new(
        component_id: impl Into<String>,
        action: AuditAction,
        field: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            action,
            field: field.into(),
            old_value: None,
            new_value: None,
            user: user.into(),
            version: None,
            effective_date: None,
        }
    }

    /// Sets the old and new values.
    pub fn with_values(mut self, old_value: impl Into<Value>, new_value: impl Into<Value>) -> Self {
        self.old_value = Some(old_value.into());
        self.new_value = Some(new_value.into());
        self
    }
}

fn to_json<T: Serialize>(value: Option<T>) -> Option<Value> {
    value.and_then(|value| serde_json::to_value(value).ok())
}

/// Builds one entry per field `change` touched going from `before` to `after`.
pub(crate) fn change_entries(
    change: &ComponentChange,
    before: &ComponentVersion,
    after: &ComponentVersion,
    action: AuditAction,
) -> Vec<AuditEntry> {
    let entry = |field: &str, old_value, new_value| AuditEntry {
        component_id: after.component.id.clone(),
        action,
        field: field.to_string(),
        old_value,
        new_value,
        user: change.changed_by.clone(),
        version: Some(after.version),
        effective_date: Some(after.effective_date),
    };

    let mut entries = Vec::new();
    if change.calculation_value.is_some() {
        entries.push(entry(
            "calculation_value",
            to_json(before.component.calculation_value()),
            to_json(after.component.calculation_value()),
        ));
    }
    if change.validation_rules.is_some() {
        entries.push(entry(
            "validation_rules",
            to_json(before.component.validation_rules.as_ref()),
            to_json(after.component.validation_rules.as_ref()),
        ));
    }
    entries
}
