//! Evaluation context models.
//!
//! This module contains the [`EvaluationContext`] that a caller assembles
//! per employee before invoking the engine, and the [`ContextValue`] type
//! used for its named inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of the context keys under which resolved component amounts are published.
pub const COMPONENT_AMOUNT_PREFIX: &str = "components.";

/// Suffix of the context keys under which resolved component amounts are published.
pub const COMPONENT_AMOUNT_SUFFIX: &str = ".amount";

/// Returns the context key holding the resolved amount of a component.
///
/// # Example
///
/// ```
/// use payroll_engine::models::component_amount_key;
///
/// assert_eq!(component_amount_key("basic_salary"), "components.basic_salary.amount");
/// ```
pub fn component_amount_key(component_id: &str) -> String {
    format!("{COMPONENT_AMOUNT_PREFIX}{component_id}{COMPONENT_AMOUNT_SUFFIX}")
}

/// Extracts the component id from a `components.<id>.amount` key.
pub fn component_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(COMPONENT_AMOUNT_PREFIX)?
        .strip_suffix(COMPONENT_AMOUNT_SUFFIX)
        .filter(|id| !id.is_empty())
}

/// A named input value supplied by the caller.
///
/// Numbers are exact decimals; text covers attributes such as a
/// performance rating; flags cover yes/no attributes.
///
/// Quoted input always deserializes as text, so an identifier such as
/// `"007"` keeps its leading zeros and compares as text. Numeric rules still
/// read text that parses as a decimal through [`ContextValue::as_number`],
/// which is how amounts too precise for a JSON number are supplied.
///
/// # Example
///
/// ```
/// use payroll_engine::models::ContextValue;
/// use rust_decimal::Decimal;
///
/// let code: ContextValue = serde_json::from_str("\"007\"").unwrap();
/// assert_eq!(code, ContextValue::Text("007".to_string()));
/// assert_eq!(code.as_number(), Some(Decimal::from(7)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    /// A numeric value (amounts, counts, years).
    Number(Decimal),
    /// A boolean attribute.
    Flag(bool),
    /// A textual attribute.
    Text(String),
}

impl ContextValue {
    /// Returns the numeric value: the number itself, or text that parses as
    /// a decimal.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            ContextValue::Number(value) => Some(*value),
            ContextValue::Text(value) => Decimal::from_str(value.trim()).ok(),
            ContextValue::Flag(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for ContextValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ContextValueVisitor)
    }
}

struct ContextValueVisitor;

impl Visitor<'_> for ContextValueVisitor {
    type Value = ContextValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a boolean or a string")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(ContextValue::Flag(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(ContextValue::Number(Decimal::from(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(ContextValue::Number(Decimal::from(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Decimal::try_from(value)
            .map(ContextValue::Number)
            .map_err(|_| E::invalid_value(Unexpected::Float(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(ContextValue::Text(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(ContextValue::Text(value))
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Number(value) => write!(f, "{}", value.normalize()),
            ContextValue::Flag(value) => write!(f, "{value}"),
            ContextValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<Decimal> for ContextValue {
    fn from(value: Decimal) -> Self {
        ContextValue::Number(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Number(Decimal::from(value))
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Number(Decimal::from(value))
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Flag(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

/// The inputs for evaluating components for one employee and one period.
///
/// The context is assembled by the caller (base salary, attendance,
/// employee attributes) before invocation; the engine never fetches data.
///
/// # Example
///
/// ```
/// use payroll_engine::models::EvaluationContext;
/// use rust_decimal::Decimal;
///
/// let context = EvaluationContext::new()
///     .with_employee("emp_001")
///     .with_value("basic_salary", Decimal::new(5000, 0))
///     .with_value("performance_rating", "A");
///
/// assert_eq!(context.number("basic_salary"), Some(Decimal::new(5000, 0)));
/// assert_eq!(context.employee_id(), Some("emp_001"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// The employee being evaluated, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    /// Named inputs referenced by rules, formulas and conditions.
    #[serde(default)]
    pub values: BTreeMap<String, ContextValue>,
    /// First day of the full pay period (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    /// Last day of the full pay period (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
    /// First day the component applies to the employee, if later than the period start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_start: Option<NaiveDate>,
    /// Last day the component applies to the employee, if earlier than the period end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_end: Option<NaiveDate>,
}

impl EvaluationContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the employee id.
    pub fn with_employee(mut self, employee_id: impl Into<String>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }

    /// Adds a named value.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Sets the full pay period.
    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.period_start = Some(start);
        self.period_end = Some(end);
        self
    }

    /// Sets the window during which the component is active for the employee.
    pub fn with_active_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.active_start = Some(start);
        self.active_end = Some(end);
        self
    }

    /// Returns the employee id, if known.
    pub fn employee_id(&self) -> Option<&str> {
        self.employee_id.as_deref()
    }

    /// Returns a named value.
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Returns a named value if it is numeric.
    pub fn number(&self, key: &str) -> Option<Decimal> {
        self.get(key).and_then(ContextValue::as_number)
    }

    /// Inserts or replaces a named value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Publishes the resolved amount of a component for its dependents.
    pub fn insert_component_amount(&mut self, component_id: &str, amount: Decimal) {
        self.values
            .insert(component_amount_key(component_id), ContextValue::Number(amount));
    }

    /// Returns the full period, if both bounds are set.
    pub fn full_period(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.period_start?, self.period_end?))
    }

    /// Returns the component's active window, defaulting each bound to the
    /// full period when it is not set.
    pub fn active_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let (start, end) = self.full_period()?;
        Some((
            self.active_start.unwrap_or(start),
            self.active_end.unwrap_or(end),
        ))
    }
}
