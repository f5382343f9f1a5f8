//! Effective-dated component versions and the changes that create them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollComponent, ValidationRules};

/// One effective-dated version of a component.
///
/// Versions are never modified once recorded; a change appends a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentVersion {
    /// Sequential version number, starting at 1.
    pub version: u32,
    /// The first day this version applies.
    pub effective_date: NaiveDate,
    /// The component as of this version.
    pub component: PayrollComponent,
    /// Who made the change (absent for the initial version).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
    /// Why the change was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A change to a component's calculation value and/or validation rules.
///
/// # Example
///
/// ```
/// use payroll_engine::catalog::ComponentChange;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let change = ComponentChange::new(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(), "hr_admin")
///     .with_calculation_value(Decimal::from(12));
/// assert_eq!(change.calculation_value, Some(Decimal::from(12)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentChange {
    /// The first day the changed component applies.
    pub effective_date: NaiveDate,
    /// Who made the change.
    pub changed_by: String,
    /// The new amount (fixed) or rate (percentage, conditional base).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_value: Option<Decimal>,
    /// The new validation rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
    /// Why the change was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ComponentChange {
    /// Creates a change that does not yet modify anything.
    pub fn new(effective_date: NaiveDate, changed_by: impl Into<String>) -> Self {
        Self {
            effective_date,
            changed_by: changed_by.into(),
            calculation_value: None,
            validation_rules: None,
            note: None,
        }
    }

    /// Sets the new calculation value.
    pub fn with_calculation_value(mut self, value: Decimal) -> Self {
        self.calculation_value = Some(value);
        self
    }

    /// Sets the new validation rules.
    pub fn with_validation_rules(mut self, rules: ValidationRules) -> Self {
        self.validation_rules = Some(rules);
        self
    }

    /// Sets the note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Builds the next version of `current` with this change applied.
    pub(crate) fn apply_to(&self, current: &ComponentVersion) -> EngineResult<ComponentVersion> {
        let component_id = &current.component.id;

        if self.calculation_value.is_none() && self.validation_rules.is_none() {
            return Err(EngineError::InvalidComponent {
                component_id: component_id.clone(),
                field: "change".to_string(),
                message: "a change must set calculation_value or validation_rules".to_string(),
            });
        }
        if self.effective_date < current.effective_date {
            return Err(EngineError::InvalidComponent {
                component_id: component_id.clone(),
                field: "effective_date".to_string(),
                message: format!(
                    "change effective {} precedes the current version effective {}",
                    self.effective_date, current.effective_date
                ),
            });
        }

        let mut component = current.component.clone();
        if let Some(value) = self.calculation_value {
            component.rule = current.component.rule_with_value(value)?;
        }
        if let Some(rules) = &self.validation_rules {
            component.validation_rules = Some(rules.clone());
        }

        Ok(ComponentVersion {
            version: current.version + 1,
            effective_date: self.effective_date,
            component,
            changed_by: Some(self.changed_by.clone()),
            note: self.note.clone(),
        })
    }
}
