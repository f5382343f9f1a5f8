//! Payroll run lifecycle.
//!
//! A run moves through `draft → processed → pending_approval → approved`.
//! An approver may reject a pending run instead, after which it can be
//! re-processed. Every transition records the acting user and time in the
//! run's audit log; both are passed in explicitly.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeCalculation, RunAuditEntry, RunStatus, RunSummary};

use super::plan::{EmployeeInput, EvaluationPlan, process_employees};

/// A payroll run: one pay period, many employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Unique run id.
    pub id: Uuid,
    /// First day of the pay period (inclusive).
    pub period_start: NaiveDate,
    /// Last day of the pay period (inclusive).
    pub period_end: NaiveDate,
    /// Current status.
    pub status: RunStatus,
    /// Who created the run.
    pub created_by: String,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// The latest per-employee calculations.
    pub calculations: Vec<EmployeeCalculation>,
    /// Who approved the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    /// When the run was approved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Every transition, oldest first.
    pub audit: Vec<RunAuditEntry>,
}

impl PayrollRun {
    /// Creates a draft run for a pay period.
    pub fn new(
        period_start: NaiveDate,
        period_end: NaiveDate,
        created_by: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let created_by = created_by.into();
        let mut run = Self {
            id: Uuid::new_v4(),
            period_start,
            period_end,
            status: RunStatus::Draft,
            created_by: created_by.clone(),
            created_at: at,
            calculations: Vec::new(),
            approved_by: None,
            approved_at: None,
            audit: Vec::new(),
        };
        run.record("created", &created_by, at, RunStatus::Draft, None);
        run
    }

    fn record(
        &mut self,
        action: &str,
        acting_user: &str,
        at: DateTime<Utc>,
        to: RunStatus,
        detail: Option<String>,
    ) {
        self.audit.push(RunAuditEntry {
            action: action.to_string(),
            acting_user: acting_user.to_string(),
            at,
            from: self.status,
            to,
            detail,
        });
        self.status = to;
    }

    fn ensure_status(&self, allowed: &[RunStatus], action: &str) -> EngineResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(EngineError::InvalidRunTransition {
                run_id: self.id.to_string(),
                from: self.status.as_str().to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Evaluates every employee against the plan and records the results.
    ///
    /// Contexts without a pay period get the run's period. Allowed from
    /// draft, processed and rejected; re-processing replaces earlier
    /// calculations.
    pub async fn process(
        &mut self,
        plan: Arc<EvaluationPlan>,
        inputs: Vec<EmployeeInput>,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.ensure_status(
            &[RunStatus::Draft, RunStatus::Processed, RunStatus::Rejected],
            "process",
        )?;

        let inputs = inputs
            .into_iter()
            .map(|mut input| {
                if input.context.full_period().is_none() {
                    input.context.period_start = Some(self.period_start);
                    input.context.period_end = Some(self.period_end);
                }
                input
            })
            .collect();

        let calculations = process_employees(plan, inputs).await;
        self.record_calculations(calculations, acting_user, at);
        Ok(())
    }

    /// Records calculations produced elsewhere, as [`PayrollRun::process`] does.
    pub fn record_calculations(
        &mut self,
        calculations: Vec<EmployeeCalculation>,
        acting_user: &str,
        at: DateTime<Utc>,
    ) {
        self.calculations = calculations;
        let detail = format!(
            "{} employee(s), {} unresolved error(s)",
            self.calculations.len(),
            self.unresolved_errors()
        );
        debug!(run_id = %self.id, %detail, "Processed payroll run");
        self.record("processed", acting_user, at, RunStatus::Processed, Some(detail));
    }

    /// Returns the number of failed employee/component evaluations.
    pub fn unresolved_errors(&self) -> usize {
        self.calculations.iter().map(|c| c.failures.len()).sum()
    }

    /// Submits a processed run for approval.
    ///
    /// # Errors
    ///
    /// - `InvalidRunTransition` unless the run is processed.
    /// - `RunBlocked` while any evaluation error is unresolved.
    pub fn submit_for_approval(
        &mut self,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.ensure_status(&[RunStatus::Processed], "submit for approval")?;

        let unresolved = self.unresolved_errors();
        if unresolved > 0 {
            return Err(EngineError::RunBlocked {
                run_id: self.id.to_string(),
                unresolved,
            });
        }

        self.record("submitted", acting_user, at, RunStatus::PendingApproval, None);
        Ok(())
    }

    /// Approves a pending run.
    pub fn approve(&mut self, acting_user: &str, at: DateTime<Utc>) -> EngineResult<()> {
        self.ensure_status(&[RunStatus::PendingApproval], "approve")?;

        self.approved_by = Some(acting_user.to_string());
        self.approved_at = Some(at);
        self.record("approved", acting_user, at, RunStatus::Approved, None);
        info!(run_id = %self.id, approved_by = %acting_user, "Payroll run approved");
        Ok(())
    }

    /// Rejects a pending run.
    pub fn reject(
        &mut self,
        acting_user: &str,
        at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> EngineResult<()> {
        self.ensure_status(&[RunStatus::PendingApproval], "reject")?;

        self.record("rejected", acting_user, at, RunStatus::Rejected, Some(reason.into()));
        Ok(())
    }

    /// Returns statistics over the run's calculations.
    ///
    /// # Errors
    ///
    /// Returns `CalculationError` if the run totals overflow.
    pub fn summary(&self) -> EngineResult<RunSummary> {
        RunSummary::from_calculations(&self.calculations)
    }
}
