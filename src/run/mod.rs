//! Payroll runs.
//!
//! An [`EvaluationPlan`] fixes a component set and its dependency order
//! once; [`process_employees`] evaluates many employees against it
//! concurrently; a [`PayrollRun`] records the results for a pay period and
//! carries them through approval.

mod lifecycle;
mod plan;

pub use lifecycle::PayrollRun;
pub use plan::{EmployeeInput, EvaluationPlan, process_employees};
