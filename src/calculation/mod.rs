//! Calculation logic for the payroll engine.
//!
//! This module contains the four engine stages: rule evaluation (fixed,
//! percentage, formula and conditional rules), dependency resolution,
//! partial-period proration and threshold validation, together with the
//! formula parser and the eligibility predicates the rules are built from.

mod conditions;
mod dependency;
mod formula;
mod proration;
mod rounding;
mod rule_evaluator;
mod validation;

pub use conditions::{
    ConditionValue, ConditionsDefinition, Eligibility, MIN_YEARS_SERVICE, Operator, Predicate,
    YEARS_OF_SERVICE, check_eligibility,
};
pub use dependency::resolve_order;
pub use formula::{Formula, FormulaError, MAX_FORMULA_DEPTH};
pub use proration::{ProrationResult, calculate_proration, inclusive_days, overlap_days, prorate};
pub use rounding::{CURRENCY_DECIMAL_PLACES, round_currency};
pub use rule_evaluator::evaluate;
pub use validation::{ValidationResult, calculate_validation, validate};
