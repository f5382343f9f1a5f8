//! Payroll run models.
//!
//! This module contains the per-employee [`EmployeeCalculation`] produced by
//! a payroll run, its [`PayTotals`], and the run-level status, audit and
//! summary types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{ComponentType, EvaluationResult};

/// Aggregated totals for one employee (or a whole run).
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayTotals;
/// use rust_decimal::Decimal;
///
/// let totals = PayTotals::default();
/// assert_eq!(totals.net_pay, Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayTotals {
    /// Sum of earning components.
    pub earnings: Decimal,
    /// Sum of allowance components.
    pub allowances: Decimal,
    /// Sum of bonus components.
    pub bonuses: Decimal,
    /// Sum of deduction components.
    pub deductions: Decimal,
    /// Earnings + allowances + bonuses.
    pub gross_pay: Decimal,
    /// Gross pay minus deductions.
    pub net_pay: Decimal,
    /// The taxable part of gross pay.
    pub taxable_gross: Decimal,
}

impl PayTotals {
    /// Totals the successful results, using each result's effective amount.
    ///
    /// # Errors
    ///
    /// Returns `CalculationError` if a total overflows.
    pub fn from_results(results: &[EvaluationResult]) -> EngineResult<Self> {
        let mut totals = PayTotals::default();

        for result in results.iter().filter(|r| r.success) {
            let amount = result.effective_amount();
            let (bucket, label) = match result.component_type {
                ComponentType::Earning => (&mut totals.earnings, "earnings"),
                ComponentType::Allowance => (&mut totals.allowances, "allowances"),
                ComponentType::Bonus => (&mut totals.bonuses, "bonuses"),
                ComponentType::Deduction => (&mut totals.deductions, "deductions"),
            };
            *bucket = checked_sum(*bucket, amount, label)?;
            if result.is_taxable && !result.component_type.is_deduction() {
                totals.taxable_gross = checked_sum(totals.taxable_gross, amount, "taxable gross")?;
            }
        }

        totals.gross_pay = checked_sum(totals.earnings, totals.allowances, "gross pay")
            .and_then(|partial| checked_sum(partial, totals.bonuses, "gross pay"))?;
        totals.net_pay = totals
            .gross_pay
            .checked_sub(totals.deductions)
            .ok_or_else(|| overflow("net pay"))?;
        Ok(totals)
    }

    /// Adds another set of totals to this one.
    ///
    /// Leaves `self` unchanged if any total would overflow.
    pub fn accumulate(&mut self, other: &PayTotals) -> EngineResult<()> {
        *self = PayTotals {
            earnings: checked_sum(self.earnings, other.earnings, "earnings")?,
            allowances: checked_sum(self.allowances, other.allowances, "allowances")?,
            bonuses: checked_sum(self.bonuses, other.bonuses, "bonuses")?,
            deductions: checked_sum(self.deductions, other.deductions, "deductions")?,
            gross_pay: checked_sum(self.gross_pay, other.gross_pay, "gross pay")?,
            net_pay: checked_sum(self.net_pay, other.net_pay, "net pay")?,
            taxable_gross: checked_sum(self.taxable_gross, other.taxable_gross, "taxable gross")?,
        };
        Ok(())
    }
}

fn checked_sum(left: Decimal, right: Decimal, label: &str) -> EngineResult<Decimal> {
    left.checked_add(right).ok_or_else(|| overflow(label))
}

fn overflow(label: &str) -> EngineError {
    EngineError::CalculationError {
        message: format!("{label} total overflowed"),
    }
}

/// The outcome of evaluating every component for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeCalculation {
    /// The employee.
    pub employee_id: String,
    /// One result per component, in evaluation order.
    pub results: Vec<EvaluationResult>,
    /// Totals over the successful results.
    pub totals: PayTotals,
    /// The errors of failed components.
    pub failures: Vec<EngineError>,
    /// Components whose amount requires approval.
    pub approvals_required: Vec<String>,
    /// Components whose amount exceeded their maximum.
    pub limit_violations: Vec<String>,
}

impl EmployeeCalculation {
    /// Builds the calculation from the employee's results.
    ///
    /// If the totals overflow, they are left at zero and the overflow is
    /// recorded as one more failure.
    pub fn from_results(employee_id: impl Into<String>, results: Vec<EvaluationResult>) -> Self {
        let employee_id = employee_id.into();
        let mut failures: Vec<EngineError> =
            results.iter().filter_map(|r| r.error.clone()).collect();
        let totals = match PayTotals::from_results(&results) {
            Ok(totals) => totals,
            Err(err) => {
                failures.push(EngineError::CalculationError {
                    message: format!("pay totals for employee '{employee_id}': {err}"),
                });
                PayTotals::default()
            }
        };
        let approvals_required = results
            .iter()
            .filter(|r| r.success && r.needs_approval())
            .map(|r| r.component_id.clone())
            .collect();
        let limit_violations = results
            .iter()
            .filter(|r| r.success && r.exceeds_maximum())
            .map(|r| r.component_id.clone())
            .collect();

        Self {
            employee_id,
            results,
            totals,
            failures,
            approvals_required,
            limit_violations,
        }
    }

    /// Builds a calculation with no results for an employee whose
    /// evaluation could not complete.
    pub fn failed(employee_id: impl Into<String>, error: EngineError) -> Self {
        Self {
            employee_id: employee_id.into(),
            results: Vec::new(),
            totals: PayTotals::default(),
            failures: vec![error],
            approvals_required: Vec::new(),
            limit_violations: Vec::new(),
        }
    }

    /// Returns the result for a component.
    pub fn result(&self, component_id: &str) -> Option<&EvaluationResult> {
        self.results.iter().find(|r| r.component_id == component_id)
    }

    /// Returns whether any component failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Lifecycle status of a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, not yet calculated.
    Draft,
    /// Calculated; may be re-processed.
    Processed,
    /// Submitted and awaiting approval.
    PendingApproval,
    /// Approved for payment.
    Approved,
    /// Rejected by an approver; may be re-processed.
    Rejected,
}

impl RunStatus {
    /// Returns the snake_case name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Draft => "draft",
            RunStatus::Processed => "processed",
            RunStatus::PendingApproval => "pending_approval",
            RunStatus::Approved => "approved",
            RunStatus::Rejected => "rejected",
        }
    }
}

/// One entry in a payroll run's audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAuditEntry {
    /// What happened (e.g. "processed", "approved").
    pub action: String,
    /// Who did it.
    pub acting_user: String,
    /// When it happened.
    pub at: DateTime<Utc>,
    /// Status before the action.
    pub from: RunStatus,
    /// Status after the action.
    pub to: RunStatus,
    /// Free-text detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Statistics over a payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of employees calculated.
    pub employee_count: usize,
    /// Totals over all employees.
    pub totals: PayTotals,
    /// Average gross pay per employee.
    pub average_gross: Decimal,
    /// Number of failed employee/component evaluations.
    pub failure_count: usize,
    /// Number of employee/component amounts awaiting approval.
    pub approvals_required: usize,
    /// Number of employee/component amounts above their maximum.
    pub limit_violations: usize,
}

impl RunSummary {
    /// Builds the summary from per-employee calculations.
    ///
    /// # Errors
    ///
    /// Returns `CalculationError` if the run totals overflow.
    pub fn from_calculations(calculations: &[EmployeeCalculation]) -> EngineResult<Self> {
        let mut totals = PayTotals::default();
        for calculation in calculations {
            totals.accumulate(&calculation.totals)?;
        }

        let employee_count = calculations.len();
        let average_gross = if employee_count == 0 {
            Decimal::ZERO
        } else {
            crate::calculation::round_currency(totals.gross_pay / Decimal::from(employee_count))
        };

        Ok(Self {
            employee_count,
            average_gross,
            failure_count: calculations.iter().map(|c| c.failures.len()).sum(),
            approvals_required: calculations.iter().map(|c| c.approvals_required.len()).sum(),
            limit_violations: calculations.iter().map(|c| c.limit_violations.len()).sum(),
            totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn result(id: &str, component_type: ComponentType, amount: &str) -> EvaluationResult {
        EvaluationResult {
            component_id: id.to_string(),
            employee_id: Some("emp_001".to_string()),
            component_type,
            amount: dec(amount),
            success: true,
            eligible: None,
            prorated_amount: None,
            requires_approval: None,
            is_valid: None,
            error: None,
            is_taxable: true,
            tax_category: None,
            audit_steps: vec![],
        }
    }

    #[test]
    fn test_totals_split_by_type() {
        let results = vec![
            result("basic", ComponentType::Earning, "5000"),
            result("housing", ComponentType::Allowance, "1000"),
            result("loan", ComponentType::Deduction, "500"),
            result("bonus", ComponentType::Bonus, "250"),
        ];
        let totals = PayTotals::from_results(&results).unwrap();

        assert_eq!(totals.earnings, dec("5000"));
        assert_eq!(totals.allowances, dec("1000"));
        assert_eq!(totals.bonuses, dec("250"));
        assert_eq!(totals.deductions, dec("500"));
        assert_eq!(totals.gross_pay, dec("6250"));
        assert_eq!(totals.net_pay, dec("5750"));
        assert_eq!(totals.taxable_gross, dec("6250"));
    }

    #[test]
    fn test_totals_skip_failures_and_use_prorated_amounts() {
        let mut failed = result("housing", ComponentType::Allowance, "0");
        failed.success = false;
        let mut prorated = result("transport", ComponentType::Allowance, "1000");
        prorated.prorated_amount = Some(dec("500"));
        prorated.is_taxable = false;

        let totals = PayTotals::from_results(&[failed, prorated]).unwrap();
        assert_eq!(totals.allowances, dec("500"));
        assert_eq!(totals.taxable_gross, Decimal::ZERO);
    }

    #[test]
    fn test_run_summary_for_three_employees() {
        let calculations: Vec<EmployeeCalculation> = (1..=3)
            .map(|i| {
                EmployeeCalculation::from_results(
                    format!("emp_{i:03}"),
                    vec![
                        result("basic", ComponentType::Earning, "5000"),
                        result("housing", ComponentType::Allowance, "1000"),
                        result("loan", ComponentType::Deduction, "500"),
                    ],
                )
            })
            .collect();

        let summary = RunSummary::from_calculations(&calculations).unwrap();
        assert_eq!(summary.employee_count, 3);
        assert_eq!(summary.totals.gross_pay, dec("18000"));
        assert_eq!(summary.totals.net_pay, dec("16500"));
        assert_eq!(summary.average_gross, dec("6000"));
        assert_eq!(summary.failure_count, 0);
    }

    #[test]
    fn test_employee_calculation_collects_flags() {
        let mut bonus = result("bonus", ComponentType::Bonus, "6000");
        bonus.requires_approval = Some(true);
        bonus.is_valid = Some(true);
        let mut failed = result("housing", ComponentType::Allowance, "0");
        failed.success = false;
        failed.error = Some(EngineError::MissingInput {
            component_id: "housing".to_string(),
            employee_id: Some("emp_001".to_string()),
            field: "basic_salary".to_string(),
        });

        let calculation = EmployeeCalculation::from_results("emp_001", vec![bonus, failed]);
        assert_eq!(calculation.approvals_required, vec!["bonus".to_string()]);
        assert!(calculation.limit_violations.is_empty());
        assert!(calculation.has_failures());
        assert_eq!(calculation.failures.len(), 1);
        assert!(calculation.result("bonus").is_some());
    }

    #[test]
    fn test_empty_summary_has_zero_average() {
        let summary = RunSummary::from_calculations(&[]).unwrap();
        assert_eq!(summary.employee_count, 0);
        assert_eq!(summary.average_gross, Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_totals_are_an_error() {
        let results = vec![
            result("basic", ComponentType::Earning, "0"),
            result("bonus", ComponentType::Bonus, "0"),
        ]
        .into_iter()
        .map(|mut r| {
            r.amount = Decimal::MAX;
            r
        })
        .collect::<Vec<_>>();

        assert!(matches!(
            PayTotals::from_results(&results),
            Err(EngineError::CalculationError { .. })
        ));
    }

    #[test]
    fn test_employee_calculation_records_totals_overflow() {
        let mut huge = result("basic", ComponentType::Earning, "0");
        huge.amount = Decimal::MAX;
        let calculation = EmployeeCalculation::from_results(
            "emp_big",
            vec![huge, result("housing", ComponentType::Allowance, "1000")],
        );

        assert_eq!(calculation.totals, PayTotals::default());
        assert_eq!(calculation.failures.len(), 1);
        assert!(matches!(
            &calculation.failures[0],
            EngineError::CalculationError { message } if message.contains("emp_big")
        ));
    }

    #[test]
    fn test_accumulate_overflow_leaves_totals_unchanged() {
        let mut totals = PayTotals {
            gross_pay: Decimal::MAX,
            ..PayTotals::default()
        };
        let before = totals.clone();
        let other = PayTotals {
            earnings: dec("1"),
            gross_pay: dec("1"),
            ..PayTotals::default()
        };

        assert!(totals.accumulate(&other).is_err());
        assert_eq!(totals, before);
    }
}
