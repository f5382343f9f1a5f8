//! Core data models for the payroll engine.
//!
//! This module contains the domain models used throughout the engine:
//! component definitions, evaluation contexts and results, and payroll run
//! records.

mod component;
mod context;
mod evaluation_result;
mod payroll_run;

pub use component::{
    BaseAmount, CalculationRule, ComponentDefinition, ComponentType, DEFAULT_APPLIES_TO,
    PayrollComponent, RuleKind, TaxTreatment, ValidationRules,
};
pub use context::{
    COMPONENT_AMOUNT_PREFIX, COMPONENT_AMOUNT_SUFFIX, ContextValue, EvaluationContext,
    component_amount_key, component_id_from_key,
};
pub use evaluation_result::{AuditStep, EvaluationResult, ValidationOutcome};
pub use payroll_run::{
    EmployeeCalculation, PayTotals, RunAuditEntry, RunStatus, RunSummary,
};
