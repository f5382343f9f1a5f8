//! Evaluation result models.
//!
//! This module contains the [`EvaluationResult`] returned for every
//! component evaluation, successful or not, and the [`AuditStep`] records
//! that explain how the amount was reached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::{ComponentType, PayrollComponent};

/// A single step in the audit trail of an evaluation.
///
/// Each step captures the input, output, and reasoning for one stage
/// (rule evaluation, proration, validation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The identifier of the stage that produced the step (e.g. "percentage_rule").
    pub rule_id: String,
    /// The human-readable name of the stage.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The outcome of checking an amount against a component's validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the amount needs approval before it is paid.
    pub requires_approval: bool,
    /// Whether the amount is within the component's maximum.
    pub is_valid: bool,
}

/// The result of evaluating one component for one employee and period.
///
/// Failures are results too: `success` is false and `error` carries the
/// structured reason, so a payroll run can record the failure and move on.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::evaluate;
/// use payroll_engine::models::{
///     CalculationRule, ComponentType, EvaluationContext, PayrollComponent,
/// };
/// use rust_decimal::Decimal;
///
/// let component = PayrollComponent::new(
///     "transport",
///     "Transport Allowance",
///     ComponentType::Allowance,
///     CalculationRule::Fixed { value: Decimal::from(300) },
/// );
/// let result = evaluate(&component, &EvaluationContext::new());
///
/// assert!(result.success);
/// assert_eq!(result.amount, Decimal::from(300));
/// assert_eq!(result.effective_amount(), Decimal::from(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The component evaluated.
    pub component_id: String,
    /// The employee evaluated, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    /// The component's line item type.
    pub component_type: ComponentType,
    /// The computed amount before proration (zero on failure).
    pub amount: Decimal,
    /// Whether evaluation completed without error.
    pub success: bool,
    /// Eligibility outcome, for conditional components only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible: Option<bool>,
    /// The amount after proration, present only if proration applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prorated_amount: Option<Decimal>,
    /// Whether approval is required, present only if validation rules exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_approval: Option<bool>,
    /// Whether the amount is within limits, present only if validation rules exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    /// The failure, if evaluation did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
    /// Pass-through taxable flag.
    pub is_taxable: bool,
    /// Pass-through tax category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_category: Option<String>,
    /// How the amount was reached.
    pub audit_steps: Vec<AuditStep>,
}

impl EvaluationResult {
    /// Creates a successful zero-amount result carrying the component's
    /// metadata, to be filled in by the evaluation stages.
    pub fn new(component: &PayrollComponent, employee_id: Option<&str>) -> Self {
        Self {
            component_id: component.id.clone(),
            employee_id: employee_id.map(str::to_string),
            component_type: component.component_type,
            amount: Decimal::ZERO,
            success: true,
            eligible: None,
            prorated_amount: None,
            requires_approval: None,
            is_valid: None,
            error: None,
            is_taxable: component.tax.is_taxable,
            tax_category: component.tax.tax_category.clone(),
            audit_steps: Vec::new(),
        }
    }

    /// Creates a failed result with a zero amount.
    pub fn failed(
        component: &PayrollComponent,
        employee_id: Option<&str>,
        error: EngineError,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.for_employee(employee_id)),
            ..Self::new(component, employee_id)
        }
    }

    /// Returns the amount payable: the prorated amount if proration applied,
    /// otherwise the computed amount.
    pub fn effective_amount(&self) -> Decimal {
        self.prorated_amount.unwrap_or(self.amount)
    }

    /// Returns whether this result needs approval.
    pub fn needs_approval(&self) -> bool {
        self.requires_approval.unwrap_or(false)
    }

    /// Returns whether this result exceeded its maximum amount.
    pub fn exceeds_maximum(&self) -> bool {
        self.is_valid == Some(false)
    }
}
