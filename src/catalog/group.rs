//! Named sets of components: groups for reporting, templates for onboarding.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::PayrollComponent;
use crate::run::EvaluationPlan;

/// A named collection of components, such as a benefits package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentGroup {
    /// Unique group id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Member component ids, in display order.
    pub components: Vec<String>,
}

impl ComponentGroup {
    /// Creates an empty group.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            components: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a member component.
    pub fn with_component(mut self, component_id: impl Into<String>) -> Self {
        self.components.push(component_id.into());
        self
    }
}

/// A reusable component package applied to an employee as a whole.
///
/// Unlike a group, a template must be closed under dependencies: every
/// component a member depends on is a member too, so an applied template
/// can always be evaluated on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTemplate {
    /// Unique template id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Member component ids.
    pub components: Vec<String>,
}

impl ComponentTemplate {
    /// Creates an empty template.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            components: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a member component.
    pub fn with_component(mut self, component_id: impl Into<String>) -> Self {
        self.components.push(component_id.into());
        self
    }
}

/// The components a template assigns to one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedTemplate {
    /// The template applied.
    pub template_id: String,
    /// The employee it was applied to.
    pub employee_id: String,
    /// The date the component versions were taken from.
    pub effective_date: NaiveDate,
    /// The member components as they were on `effective_date`.
    pub components: Vec<PayrollComponent>,
}

impl AppliedTemplate {
    /// Builds an evaluation plan over the applied components.
    pub fn plan(&self) -> EngineResult<EvaluationPlan> {
        EvaluationPlan::new(self.components.clone())
    }
}
