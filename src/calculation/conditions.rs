//! Eligibility predicates for conditional components.
//!
//! A conditional component applies only when every one of its predicates
//! holds for the employee's context. Predicates are configured either in the
//! structured form
//!
//! ```yaml
//! conditions:
//!   - { field: years_of_service, operator: ">=", value: 3 }
//!   - { field: department, operator: in, value: [site, workshop] }
//! ```
//!
//! or in the shorthand map form kept from older catalogs:
//!
//! ```yaml
//! conditions:
//!   min_years_service: 3
//!   performance_rating: A
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{ContextValue, EvaluationContext};

/// Shorthand key for the minimum tenure condition.
pub const MIN_YEARS_SERVICE: &str = "min_years_service";

/// Context field holding the employee's tenure in years.
pub const YEARS_OF_SERVICE: &str = "years_of_service";

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Equal.
    #[serde(rename = "=", alias = "==")]
    Eq,
    /// Not equal.
    #[serde(rename = "!=")]
    Ne,
    /// Greater than.
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Gte,
    /// Less than.
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Lte,
    /// Member of a list.
    #[serde(rename = "in")]
    In,
    /// Not a member of a list.
    #[serde(rename = "not_in")]
    NotIn,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "in",
            Operator::NotIn => "not_in",
        };
        f.write_str(symbol)
    }
}

/// The right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// A single value.
    Scalar(ContextValue),
    /// A list of values, for `in` / `not_in`.
    List(Vec<ContextValue>),
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Scalar(value) => write!(f, "{value}"),
            ConditionValue::List(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// A single eligibility test against a context field.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{Operator, Predicate};
/// use payroll_engine::models::EvaluationContext;
///
/// let predicate = Predicate::new("years_of_service", Operator::Gte, 3);
/// let context = EvaluationContext::new().with_value("years_of_service", 4);
/// assert!(predicate.holds(&context));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// The context field tested.
    pub field: String,
    /// The comparison.
    pub operator: Operator,
    /// The expected value.
    pub value: ConditionValue,
}

impl Predicate {
    /// Creates a predicate over a scalar value.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<ContextValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: ConditionValue::Scalar(value.into()),
        }
    }

    /// Builds a predicate from a shorthand `key: value` entry.
    ///
    /// `min_<field>` means `<field> >= value`, `max_<field>` means
    /// `<field> <= value`, and any other key is an equality test.
    /// `min_years_service` tests the `years_of_service` field.
    pub fn from_shorthand(key: &str, value: ConditionValue) -> Self {
        let (field, operator) = if key == MIN_YEARS_SERVICE {
            (YEARS_OF_SERVICE, Operator::Gte)
        } else if let Some(field) = key.strip_prefix("min_") {
            (field, Operator::Gte)
        } else if let Some(field) = key.strip_prefix("max_") {
            (field, Operator::Lte)
        } else if matches!(value, ConditionValue::List(_)) {
            (key, Operator::In)
        } else {
            (key, Operator::Eq)
        };

        Self {
            field: field.to_string(),
            operator,
            value,
        }
    }

    /// Returns whether the predicate holds for the context.
    ///
    /// A predicate over a field that is absent from the context does not hold.
    pub fn holds(&self, context: &EvaluationContext) -> bool {
        let Some(actual) = context.get(&self.field) else {
            return false;
        };

        match (&self.operator, &self.value) {
            (Operator::In, ConditionValue::List(values)) => {
                values.iter().any(|expected| values_equal(actual, expected))
            }
            (Operator::NotIn, ConditionValue::List(values)) => {
                !values.iter().any(|expected| values_equal(actual, expected))
            }
            (Operator::In, ConditionValue::Scalar(expected)) => values_equal(actual, expected),
            (Operator::NotIn, ConditionValue::Scalar(expected)) => !values_equal(actual, expected),
            (Operator::Eq, ConditionValue::Scalar(expected)) => values_equal(actual, expected),
            (Operator::Ne, ConditionValue::Scalar(expected)) => !values_equal(actual, expected),
            (operator, ConditionValue::Scalar(expected)) => {
                match (actual.as_number(), expected.as_number()) {
                    (Some(actual), Some(expected)) => match operator {
                        Operator::Gt => actual > expected,
                        Operator::Gte => actual >= expected,
                        Operator::Lt => actual < expected,
                        Operator::Lte => actual <= expected,
                        _ => false,
                    },
                    _ => false,
                }
            }
            (_, ConditionValue::List(_)) => false,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// Text compares as text; a number against text compares numerically.
fn values_equal(actual: &ContextValue, expected: &ContextValue) -> bool {
    match (actual, expected) {
        (ContextValue::Number(a), ContextValue::Number(b)) => a == b,
        (ContextValue::Flag(a), ContextValue::Flag(b)) => a == b,
        (ContextValue::Text(a), ContextValue::Text(b)) => a == b,
        (ContextValue::Number(_), ContextValue::Text(_))
        | (ContextValue::Text(_), ContextValue::Number(_)) => {
            matches!((actual.as_number(), expected.as_number()), (Some(a), Some(b)) if a == b)
        }
        _ => false,
    }
}

/// The two accepted configuration forms of a component's conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionsDefinition {
    /// A list of structured predicates.
    Predicates(Vec<Predicate>),
    /// A shorthand map of `key: value` entries.
    Shorthand(BTreeMap<String, ConditionValue>),
}

impl ConditionsDefinition {
    /// Converts either form into a list of predicates.
    pub fn into_predicates(self) -> Vec<Predicate> {
        match self {
            ConditionsDefinition::Predicates(predicates) => predicates,
            ConditionsDefinition::Shorthand(entries) => entries
                .into_iter()
                .map(|(key, value)| Predicate::from_shorthand(&key, value))
                .collect(),
        }
    }
}

/// The outcome of checking a component's predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    /// Whether every predicate held.
    pub eligible: bool,
    /// The predicates that did not hold.
    pub failed: Vec<Predicate>,
}

/// Checks all predicates (logical AND).
///
/// An empty predicate list is always eligible.
pub fn check_eligibility(predicates: &[Predicate], context: &EvaluationContext) -> Eligibility {
    let failed: Vec<Predicate> = predicates
        .iter()
        .filter(|predicate| !predicate.holds(context))
        .cloned()
        .collect();

    Eligibility {
        eligible: failed.is_empty(),
        failed,
    }
}
