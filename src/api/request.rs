//! Request types for the payroll engine API.
//!
//! This module defines the JSON request bodies and query parameters of the
//! HTTP endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::EvaluationContext;
use crate::run::EmployeeInput;

/// Query parameters selecting the catalog date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsOfQuery {
    /// Show the components in effect on this date instead of the latest versions.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// Request body for the `/evaluate` endpoint.
///
/// Evaluates one component, and before it everything it depends on, in the
/// given context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// The component to evaluate.
    pub component_id: String,
    /// Evaluate the components in effect on this date (latest versions if absent).
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// The evaluation context.
    #[serde(default)]
    pub context: EvaluationContext,
}

/// Request body for the `/payroll-runs` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRunRequest {
    /// The start date of the pay period (inclusive).
    pub period_start: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub period_end: NaiveDate,
    /// Who is creating and processing the run.
    pub created_by: String,
    /// The employees to process.
    #[serde(default)]
    pub employees: Vec<EmployeeInput>,
}

impl PayrollRunRequest {
    /// Checks the request for problems serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.period_end < self.period_start {
            return Err(format!(
                "period_end {} is before period_start {}",
                self.period_end, self.period_start
            ));
        }
        if self.created_by.trim().is_empty() {
            return Err("created_by must not be empty".to_string());
        }
        Ok(())
    }
}
