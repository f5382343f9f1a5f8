//! Payroll component models.
//!
//! This module contains the [`PayrollComponent`] type, the typed
//! [`CalculationRule`] it carries, and the flat [`ComponentDefinition`]
//! record that catalogs are written in.
//!
//! A definition is converted into a component exactly once, when the catalog
//! is built. Invalid parameter combinations (a fixed rule without a value, a
//! formula that does not parse) are rejected there, so the evaluator only
//! ever sees well-formed rules.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::calculation::{ConditionsDefinition, Formula, Predicate};
use crate::error::{EngineError, EngineResult};

use super::context::{component_amount_key, component_id_from_key};

/// Context field used by percentage rules that do not name a base.
pub const DEFAULT_APPLIES_TO: &str = "base_amount";

/// The kind of payroll line item a component produces.
///
/// # Example
///
/// ```
/// use payroll_engine::models::ComponentType;
///
/// let component_type: ComponentType = serde_json::from_str("\"allowance\"").unwrap();
/// assert_eq!(component_type, ComponentType::Allowance);
/// assert!(!component_type.is_deduction());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// Regular earnings such as basic salary.
    Earning,
    /// Allowances such as housing or transport.
    Allowance,
    /// Deductions such as loans or insurance.
    Deduction,
    /// Bonuses.
    Bonus,
}

impl ComponentType {
    /// Returns the snake_case name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Earning => "earning",
            ComponentType::Allowance => "allowance",
            ComponentType::Deduction => "deduction",
            ComponentType::Bonus => "bonus",
        }
    }

    /// Returns whether amounts of this type reduce net pay.
    pub fn is_deduction(&self) -> bool {
        matches!(self, ComponentType::Deduction)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule kind named in a flat definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// A fixed amount.
    Fixed,
    /// A percentage of a context value.
    Percentage,
    /// An arithmetic formula.
    Formula,
    /// A base amount gated by eligibility predicates.
    Conditional,
}

impl RuleKind {
    /// Returns the snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Fixed => "fixed",
            RuleKind::Percentage => "percentage",
            RuleKind::Formula => "formula",
            RuleKind::Conditional => "conditional",
        }
    }
}

/// The amount an eligible conditional component pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaseAmount {
    /// A fixed amount.
    Fixed {
        /// The amount.
        value: Decimal,
    },
    /// A percentage of a context value.
    Percentage {
        /// The rate in percent (10 means 10%).
        rate: Decimal,
        /// The context field the rate applies to.
        applies_to: String,
    },
}

/// How a component's amount is computed.
///
/// Each variant carries only the parameters its kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculationRule {
    /// A fixed amount, independent of the context.
    Fixed {
        /// The amount.
        value: Decimal,
    },
    /// `context[applies_to] * rate / 100`.
    Percentage {
        /// The rate in percent (10 means 10%).
        rate: Decimal,
        /// The context field the rate applies to.
        applies_to: String,
    },
    /// An arithmetic expression over context values.
    Formula {
        /// The parsed formula.
        formula: Formula,
    },
    /// A base amount paid only when every predicate holds.
    Conditional {
        /// The eligibility predicates (logical AND).
        conditions: Vec<Predicate>,
        /// The amount paid when eligible, if any.
        base: Option<BaseAmount>,
    },
}

impl CalculationRule {
    /// Returns the kind of this rule.
    pub fn kind(&self) -> RuleKind {
        match self {
            CalculationRule::Fixed { .. } => RuleKind::Fixed,
            CalculationRule::Percentage { .. } => RuleKind::Percentage,
            CalculationRule::Formula { .. } => RuleKind::Formula,
            CalculationRule::Conditional { .. } => RuleKind::Conditional,
        }
    }

    /// Returns the context fields this rule reads.
    pub fn referenced_fields(&self) -> BTreeSet<&str> {
        let mut fields = BTreeSet::new();
        match self {
            CalculationRule::Fixed { .. } => {}
            CalculationRule::Percentage { applies_to, .. } => {
                fields.insert(applies_to.as_str());
            }
            CalculationRule::Formula { formula } => fields.extend(formula.variables()),
            CalculationRule::Conditional { conditions, base } => {
                fields.extend(conditions.iter().map(|p| p.field.as_str()));
                if let Some(BaseAmount::Percentage { applies_to, .. }) = base {
                    fields.insert(applies_to.as_str());
                }
            }
        }
        fields
    }
}

/// Thresholds a computed amount is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Amounts above this are invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<Decimal>,
    /// Whether large amounts need approval.
    #[serde(default)]
    pub requires_approval: bool,
    /// Amounts at or above this need approval when `requires_approval` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_threshold: Option<Decimal>,
}

/// Tax treatment flags, passed through to results untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxTreatment {
    /// Whether the amount is taxable.
    pub is_taxable: bool,
    /// The tax category (e.g. "benefit_in_kind").
    pub tax_category: Option<String>,
}

/// A single payroll line item and the rule for computing it.
///
/// Components are built from a [`ComponentDefinition`]; serde goes through
/// the same conversion, so a component deserialized from a catalog file is
/// always valid.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{CalculationRule, ComponentType, PayrollComponent};
///
/// let component: PayrollComponent = serde_yaml::from_str(
///     r#"
/// id: housing_allowance
/// name: Housing Allowance
/// type: allowance
/// calculation_rule: percentage
/// calculation_value: 15
/// applies_to: basic_salary
/// is_taxable: true
/// "#,
/// )
/// .unwrap();
///
/// assert_eq!(component.component_type, ComponentType::Allowance);
/// assert!(matches!(component.rule, CalculationRule::Percentage { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ComponentDefinition", into = "ComponentDefinition")]
pub struct PayrollComponent {
    /// Unique identifier.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Line item type.
    pub component_type: ComponentType,
    /// How the amount is computed.
    pub rule: CalculationRule,
    /// Tax treatment flags.
    pub tax: TaxTreatment,
    /// Whether partial-period proration applies.
    pub is_prorated: bool,
    /// Components that must be resolved before this one.
    pub depends_on: Vec<String>,
    /// Optional approval and maximum thresholds.
    pub validation_rules: Option<ValidationRules>,
    /// Free-text description.
    pub description: Option<String>,
}

impl PayrollComponent {
    /// Creates a component with no dependencies, tax flags or validation rules.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        component_type: ComponentType,
        rule: CalculationRule,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            component_type,
            rule,
            tax: TaxTreatment::default(),
            is_prorated: false,
            depends_on: Vec::new(),
            validation_rules: None,
            description: None,
        }
    }

    /// Adds a dependency edge.
    pub fn depending_on(mut self, component_id: impl Into<String>) -> Self {
        self.depends_on.push(component_id.into());
        self
    }

    /// Marks the component as prorated.
    pub fn prorated(mut self) -> Self {
        self.is_prorated = true;
        self
    }

    /// Sets the validation rules.
    pub fn with_validation_rules(mut self, rules: ValidationRules) -> Self {
        self.validation_rules = Some(rules);
        self
    }

    /// Returns every component this one must be evaluated after.
    ///
    /// This is the union of the declared `depends_on` edges and any
    /// `components.<id>.amount` field the rule reads.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut dependencies: BTreeSet<String> = self.depends_on.iter().cloned().collect();
        dependencies.extend(
            self.rule
                .referenced_fields()
                .into_iter()
                .filter_map(component_id_from_key)
                .map(str::to_string),
        );
        dependencies
    }

    /// Returns the amount or rate a change to `calculation_value` replaces.
    ///
    /// `None` for formula rules and for conditional rules without a base.
    pub fn calculation_value(&self) -> Option<Decimal> {
        let base = match &self.rule {
            CalculationRule::Fixed { value } => return Some(*value),
            CalculationRule::Percentage { rate, .. } => return Some(*rate),
            CalculationRule::Formula { .. } => return None,
            CalculationRule::Conditional { base, .. } => base.as_ref()?,
        };
        match base {
            BaseAmount::Fixed { value } => Some(*value),
            BaseAmount::Percentage { rate, .. } => Some(*rate),
        }
    }

    /// Returns a copy of the rule with a new calculation value.
    ///
    /// Fixed and percentage rules take the value directly; a conditional
    /// rule applies it to its base amount (creating a fixed base when it has
    /// none). Formula rules have no calculation value.
    pub fn rule_with_value(&self, value: Decimal) -> EngineResult<CalculationRule> {
        let rule = match &self.rule {
            CalculationRule::Fixed { .. } => CalculationRule::Fixed { value },
            CalculationRule::Percentage { applies_to, .. } => CalculationRule::Percentage {
                rate: value,
                applies_to: applies_to.clone(),
            },
            CalculationRule::Conditional { conditions, base } => {
                let base = match base {
                    Some(BaseAmount::Percentage { applies_to, .. }) => BaseAmount::Percentage {
                        rate: value,
                        applies_to: applies_to.clone(),
                    },
                    Some(BaseAmount::Fixed { .. }) | None => BaseAmount::Fixed { value },
                };
                CalculationRule::Conditional {
                    conditions: conditions.clone(),
                    base: Some(base),
                }
            }
            CalculationRule::Formula { .. } => {
                return Err(EngineError::InvalidComponent {
                    component_id: self.id.clone(),
                    field: "calculation_value".to_string(),
                    message: "formula components have no calculation value".to_string(),
                });
            }
        };
        Ok(rule)
    }
}

/// The flat record form of a component, as written in catalog files.
///
/// Rule parameters are nullable siblings here; which of them are required
/// depends on `calculation_rule` and is checked when converting into a
/// [`PayrollComponent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Unique identifier.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Line item type.
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// Rule kind.
    pub calculation_rule: RuleKind,
    /// Amount (fixed) or rate in percent (percentage, conditional base).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_value: Option<Decimal>,
    /// Formula text (formula rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Eligibility predicates (conditional rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionsDefinition>,
    /// Context field a percentage applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<String>,
    /// Whether the amount is taxable.
    #[serde(default)]
    pub is_taxable: bool,
    /// Tax category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_category: Option<String>,
    /// Whether partial-period proration applies.
    #[serde(default)]
    pub is_prorated: bool,
    /// Dependency edges; a single id or a list.
    #[serde(
        default,
        deserialize_with = "deserialize_depends_on",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub depends_on: Vec<String>,
    /// Approval and maximum thresholds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn deserialize_depends_on<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(id)) => vec![id],
        Some(OneOrMany::Many(ids)) => ids,
    })
}

impl ComponentDefinition {
    fn missing(&self, field: &str) -> EngineError {
        EngineError::MissingInput {
            component_id: self.id.clone(),
            employee_id: None,
            field: field.to_string(),
        }
    }

    fn default_applies_to(&self) -> String {
        match self.depends_on.as_slice() {
            [single] => component_amount_key(single),
            _ => DEFAULT_APPLIES_TO.to_string(),
        }
    }
}

impl TryFrom<ComponentDefinition> for PayrollComponent {
    type Error = EngineError;

    fn try_from(definition: ComponentDefinition) -> EngineResult<Self> {
        if definition.id.trim().is_empty() {
            return Err(EngineError::InvalidComponent {
                component_id: definition.id.clone(),
                field: "id".to_string(),
                message: "component id must not be empty".to_string(),
            });
        }

        let rule = match definition.calculation_rule {
            RuleKind::Fixed => CalculationRule::Fixed {
                value: definition
                    .calculation_value
                    .ok_or_else(|| definition.missing("calculation_value"))?,
            },
            RuleKind::Percentage => CalculationRule::Percentage {
                rate: definition
                    .calculation_value
                    .ok_or_else(|| definition.missing("calculation_value"))?,
                applies_to: definition
                    .applies_to
                    .clone()
                    .unwrap_or_else(|| definition.default_applies_to()),
            },
            RuleKind::Formula => {
                let source = definition
                    .formula
                    .as_deref()
                    .ok_or_else(|| definition.missing("formula"))?;
                let formula = Formula::parse(source).map_err(|err| EngineError::Formula {
                    component_id: definition.id.clone(),
                    employee_id: None,
                    formula: source.to_string(),
                    message: err.to_string(),
                })?;
                CalculationRule::Formula { formula }
            }
            RuleKind::Conditional => {
                let conditions = definition
                    .conditions
                    .clone()
                    .ok_or_else(|| definition.missing("conditions"))?
                    .into_predicates();
                let base = match (definition.calculation_value, &definition.applies_to) {
                    (Some(rate), Some(applies_to)) => Some(BaseAmount::Percentage {
                        rate,
                        applies_to: applies_to.clone(),
                    }),
                    (Some(value), None) => Some(BaseAmount::Fixed { value }),
                    (None, _) => None,
                };
                CalculationRule::Conditional { conditions, base }
            }
        };

        Ok(PayrollComponent {
            id: definition.id,
            name: definition.name,
            component_type: definition.component_type,
            rule,
            tax: TaxTreatment {
                is_taxable: definition.is_taxable,
                tax_category: definition.tax_category,
            },
            is_prorated: definition.is_prorated,
            depends_on: definition.depends_on,
            validation_rules: definition.validation_rules,
            description: definition.description,
        })
    }
}

impl From<PayrollComponent> for ComponentDefinition {
    fn from(component: PayrollComponent) -> Self {
        let kind = component.rule.kind();
        let (calculation_value, formula, conditions, applies_to) = match component.rule {
            CalculationRule::Fixed { value } => (Some(value), None, None, None),
            CalculationRule::Percentage { rate, applies_to } => {
                (Some(rate), None, None, Some(applies_to))
            }
            CalculationRule::Formula { formula } => {
                (None, Some(formula.source().to_string()), None, None)
            }
            CalculationRule::Conditional { conditions, base } => {
                let conditions = Some(ConditionsDefinition::Predicates(conditions));
                match base {
                    Some(BaseAmount::Fixed { value }) => (Some(value), None, conditions, None),
                    Some(BaseAmount::Percentage { rate, applies_to }) => {
                        (Some(rate), None, conditions, Some(applies_to))
                    }
                    None => (None, None, conditions, None),
                }
            }
        };

        ComponentDefinition {
            id: component.id,
            name: component.name,
            component_type: component.component_type,
            calculation_rule: kind,
            calculation_value,
            formula,
            conditions,
            applies_to,
            is_taxable: component.tax.is_taxable,
            tax_category: component.tax.tax_category,
            is_prorated: component.is_prorated,
            depends_on: component.depends_on,
            validation_rules: component.validation_rules,
            description: component.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn definition(yaml: &str) -> ComponentDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_percentage_definition_converts() {
        let component = PayrollComponent::try_from(definition(
            r#"
id: housing_allowance
name: Housing Allowance
type: allowance
calculation_rule: percentage
calculation_value: 15
applies_to: basic_salary
is_taxable: true
description: Monthly housing allowance
"#,
        ))
        .unwrap();

        assert_eq!(component.component_type, ComponentType::Allowance);
        assert_eq!(
            component.rule,
            CalculationRule::Percentage {
                rate: dec("15"),
                applies_to: "basic_salary".to_string()
            }
        );
        assert!(component.tax.is_taxable);
    }

    #[test]
    fn test_invalid_type_is_rejected() {
        let result: Result<ComponentDefinition, _> = serde_yaml::from_str(
            "id: x\nname: Invalid Component\ntype: invalid_type\ncalculation_rule: fixed\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_fixed_without_value_is_missing_input() {
        let result = PayrollComponent::try_from(definition(
            "id: basic\nname: Basic Salary\ntype: earning\ncalculation_rule: fixed\n",
        ));
        assert_eq!(
            result,
            Err(EngineError::MissingInput {
                component_id: "basic".to_string(),
                employee_id: None,
                field: "calculation_value".to_string(),
            })
        );
    }

    #[test]
    fn test_percentage_defaults_to_single_dependency_amount() {
        let component = PayrollComponent::try_from(definition(
            r#"
id: performance_bonus
name: Performance Bonus
type: bonus
calculation_rule: percentage
calculation_value: 20
depends_on: basic
"#,
        ))
        .unwrap();

        assert_eq!(component.depends_on, vec!["basic".to_string()]);
        assert_eq!(
            component.rule,
            CalculationRule::Percentage {
                rate: dec("20"),
                applies_to: "components.basic.amount".to_string()
            }
        );
    }

    #[test]
    fn test_percentage_defaults_to_base_amount() {
        let component = PayrollComponent::try_from(definition(
            "id: p\nname: P\ntype: allowance\ncalculation_rule: percentage\ncalculation_value: 10\n",
        ))
        .unwrap();
        assert_eq!(
            component.rule,
            CalculationRule::Percentage {
                rate: dec("10"),
                applies_to: DEFAULT_APPLIES_TO.to_string()
            }
        );
    }

    #[test]
    fn test_bad_formula_is_formula_error() {
        let result = PayrollComponent::try_from(definition(
            "id: b\nname: B\ntype: bonus\ncalculation_rule: formula\nformula: \"base_salary * (0.1\"\n",
        ));
        assert!(matches!(result, Err(EngineError::Formula { ref component_id, .. }) if component_id == "b"));
    }

    #[test]
    fn test_formula_without_text_is_missing_input() {
        let result = PayrollComponent::try_from(definition(
            "id: b\nname: B\ntype: bonus\ncalculation_rule: formula\n",
        ));
        assert!(matches!(result, Err(EngineError::MissingInput { ref field, .. }) if field == "formula"));
    }

    #[test]
    fn test_conditional_base_selection() {
        let fixed = PayrollComponent::try_from(definition(
            r#"
id: tenure_bonus
name: Tenure Bonus
type: bonus
calculation_rule: conditional
calculation_value: 750
conditions:
  min_years_service: 3
  performance_rating: A
"#,
        ))
        .unwrap();
        assert!(matches!(
            fixed.rule,
            CalculationRule::Conditional { base: Some(BaseAmount::Fixed { .. }), ref conditions } if conditions.len() == 2
        ));

        let none = PayrollComponent::try_from(definition(
            "id: t\nname: T\ntype: bonus\ncalculation_rule: conditional\nconditions:\n  performance_rating: A\n",
        ))
        .unwrap();
        assert!(matches!(
            none.rule,
            CalculationRule::Conditional { base: None, .. }
        ));
    }

    #[test]
    fn test_conditional_without_conditions_is_missing_input() {
        let result = PayrollComponent::try_from(definition(
            "id: t\nname: T\ntype: bonus\ncalculation_rule: conditional\ncalculation_value: 10\n",
        ));
        assert!(matches!(result, Err(EngineError::MissingInput { ref field, .. }) if field == "conditions"));
    }

    #[test]
    fn test_dependencies_include_formula_references() {
        let component = PayrollComponent::try_from(definition(
            r#"
id: overtime
name: Overtime
type: earning
calculation_rule: formula
formula: "components.basic.amount / 30 * overtime_days"
depends_on: [attendance]
"#,
        ))
        .unwrap();

        let dependencies: Vec<String> = component.dependencies().into_iter().collect();
        assert_eq!(dependencies, vec!["attendance".to_string(), "basic".to_string()]);
    }

    #[test]
    fn test_serialization_round_trips_through_definition() {
        let yaml = r#"
id: tenure_bonus
name: Tenure Bonus
type: bonus
calculation_rule: conditional
calculation_value: 10
applies_to: basic_salary
conditions:
  - { field: years_of_service, operator: ">=", value: 3 }
validation_rules:
  max_amount: 10000
  requires_approval: true
  approval_threshold: 5000
"#;
        let component: PayrollComponent = serde_yaml::from_str(yaml).unwrap();
        let json = serde_json::to_string(&component).unwrap();
        let back: PayrollComponent = serde_json::from_str(&json).unwrap();
        assert_eq!(component, back);
    }

    #[test]
    fn test_rule_with_value() {
        let component = PayrollComponent::new(
            "transport",
            "Transport",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: dec("300") },
        );
        assert_eq!(
            component.rule_with_value(dec("350")).unwrap(),
            CalculationRule::Fixed { value: dec("350") }
        );

        let formula = PayrollComponent::new(
            "bonus",
            "Bonus",
            ComponentType::Bonus,
            CalculationRule::Formula {
                formula: Formula::parse("base * 2").unwrap(),
            },
        );
        assert!(matches!(
            formula.rule_with_value(dec("1")),
            Err(EngineError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_calculation_value_reads_amount_or_rate() {
        let fixed = PayrollComponent::new(
            "transport",
            "Transport",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: dec("300") },
        );
        assert_eq!(fixed.calculation_value(), Some(dec("300")));

        let conditional = PayrollComponent::new(
            "tenure",
            "Tenure",
            ComponentType::Bonus,
            CalculationRule::Conditional {
                conditions: vec![],
                base: Some(BaseAmount::Percentage {
                    rate: dec("15"),
                    applies_to: "base_salary".to_string(),
                }),
            },
        );
        assert_eq!(conditional.calculation_value(), Some(dec("15")));

        let formula = PayrollComponent::new(
            "bonus",
            "Bonus",
            ComponentType::Bonus,
            CalculationRule::Formula {
                formula: Formula::parse("base * 2").unwrap(),
            },
        );
        assert_eq!(formula.calculation_value(), None);
    }
}
