//! Rule evaluation.
//!
//! [`evaluate`] turns a component and an evaluation context into an
//! [`EvaluationResult`]. The stages run in a fixed order: the calculation
//! rule, then proration (for prorated components when the context carries a
//! pay period), then validation (when the component has validation rules).
//! Each stage appends one audit step.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, BaseAmount, CalculationRule, EvaluationContext, EvaluationResult, PayrollComponent,
};

use super::conditions::{Predicate, check_eligibility};
use super::formula::Formula;
use super::proration::calculate_proration;
use super::rounding::round_currency;
use super::validation::calculate_validation;

/// The amount produced by the calculation rule stage.
struct RuleOutcome {
    amount: Decimal,
    eligible: Option<bool>,
    audit_step: AuditStep,
}

/// Evaluates a component against a context.
///
/// Evaluation never fails as a function call: errors are reported in the
/// result with `success = false`, a zero amount and the structured error,
/// so callers processing many components can record the failure and carry
/// on. The same component and context always produce the same result.
///
/// - Fixed rules return their value unchanged.
/// - Percentage rules return `context[applies_to] * rate / 100`, rounded to
///   cents. A missing or non-numeric base is a `MissingInput` error.
/// - Formula rules return the formula's value, rounded to cents.
/// - Conditional rules return their base amount when every predicate holds
///   (zero when there is no base) and zero with `eligible = false` when any
///   predicate fails.
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
/// let housing = PayrollComponent::new(
///     "housing_allowance",
///     "Housing Allowance",
///     ComponentType::Allowance,
///     CalculationRule::Percentage {
///         rate: Decimal::from(15),
///         applies_to: "basic_salary".to_string(),
///     },
/// );
/// let context = EvaluationContext::new()
///     .with_employee("emp_001")
///     .with_value("basic_salary", Decimal::from(5000));
///
/// let result = evaluate(&housing, &context);
/// assert!(result.success);
/// assert_eq!(result.amount, Decimal::from(750));
/// ```
pub fn evaluate(component: &PayrollComponent, context: &EvaluationContext) -> EvaluationResult {
    let outcome = match evaluate_rule(component, context) {
        Ok(outcome) => outcome,
        Err(error) => return EvaluationResult::failed(component, context.employee_id(), error),
    };

    let mut result = EvaluationResult::new(component, context.employee_id());
    result.amount = outcome.amount;
    result.eligible = outcome.eligible;
    result.audit_steps.push(outcome.audit_step);

    // Ineligible conditional components pay nothing; there is nothing to
    // prorate or validate.
    if outcome.eligible == Some(false) {
        return result;
    }

    if component.is_prorated {
        if let (Some(period), Some(active)) = (context.full_period(), context.active_window()) {
            let step_number = next_step(&result);
            let Some(proration) = calculate_proration(result.amount, active, period, step_number)
            else {
                let error = EngineError::CalculationError {
                    message: format!(
                        "proration of {} overflowed for component '{}'",
                        result.amount.normalize(),
                        component.id
                    ),
                };
                return EvaluationResult::failed(component, context.employee_id(), error);
            };
            result.prorated_amount = Some(proration.prorated_amount);
            result.audit_steps.push(proration.audit_step);
        }
    }

    if let Some(rules) = &component.validation_rules {
        let step_number = next_step(&result);
        let validation = calculate_validation(rules, result.effective_amount(), step_number);
        result.requires_approval = Some(validation.outcome.requires_approval);
        result.is_valid = Some(validation.outcome.is_valid);
        result.audit_steps.push(validation.audit_step);
    }

    result
}

fn next_step(result: &EvaluationResult) -> u32 {
    result.audit_steps.len() as u32 + 1
}

fn evaluate_rule(
    component: &PayrollComponent,
    context: &EvaluationContext,
) -> EngineResult<RuleOutcome> {
    match &component.rule {
        CalculationRule::Fixed { value } => Ok(fixed_outcome(*value, None)),
        CalculationRule::Percentage { rate, applies_to } => {
            percentage_outcome(component, context, *rate, applies_to, None)
        }
        CalculationRule::Formula { formula } => formula_outcome(component, context, formula),
        CalculationRule::Conditional { conditions, base } => {
            conditional_outcome(component, context, conditions, base.as_ref())
        }
    }
}

fn fixed_outcome(value: Decimal, eligible: Option<bool>) -> RuleOutcome {
    RuleOutcome {
        amount: value,
        eligible,
        audit_step: AuditStep {
            step_number: 1,
            rule_id: "fixed_rule".to_string(),
            rule_name: "Fixed Amount".to_string(),
            input: serde_json::json!({ "value": value.normalize().to_string() }),
            output: serde_json::json!({ "amount": value.normalize().to_string() }),
            reasoning: format!("Fixed amount ${}", value.normalize()),
        },
    }
}

fn percentage_outcome(
    component: &PayrollComponent,
    context: &EvaluationContext,
    rate: Decimal,
    applies_to: &str,
    eligible: Option<bool>,
) -> EngineResult<RuleOutcome> {
    let base = context
        .number(applies_to)
        .ok_or_else(|| EngineError::MissingInput {
            component_id: component.id.clone(),
            employee_id: None,
            field: applies_to.to_string(),
        })?;

    let amount = base
        .checked_mul(rate)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
        .map(round_currency)
        .ok_or_else(|| EngineError::CalculationError {
            message: format!(
                "percentage of '{}' overflowed for component '{}'",
                applies_to, component.id
            ),
        })?;

    Ok(RuleOutcome {
        amount,
        eligible,
        audit_step: AuditStep {
            step_number: 1,
            rule_id: "percentage_rule".to_string(),
            rule_name: "Percentage Of Base".to_string(),
            input: serde_json::json!({
                "applies_to": applies_to,
                "base": base.normalize().to_string(),
                "rate": rate.normalize().to_string()
            }),
            output: serde_json::json!({ "amount": amount.normalize().to_string() }),
            reasoning: format!(
                "${} x {}% = ${}",
                base.normalize(),
                rate.normalize(),
                amount.normalize()
            ),
        },
    })
}

fn formula_outcome(
    component: &PayrollComponent,
    context: &EvaluationContext,
    formula: &Formula,
) -> EngineResult<RuleOutcome> {
    let raw = formula
        .evaluate(context)
        .map_err(|err| EngineError::Formula {
            component_id: component.id.clone(),
            employee_id: None,
            formula: formula.source().to_string(),
            message: err.to_string(),
        })?;
    let amount = round_currency(raw);

    let variables: serde_json::Map<String, serde_json::Value> = formula
        .variables()
        .into_iter()
        .filter_map(|name| {
            context
                .get(name)
                .map(|value| (name.to_string(), serde_json::Value::String(value.to_string())))
        })
        .collect();

    Ok(RuleOutcome {
        amount,
        eligible: None,
        audit_step: AuditStep {
            step_number: 1,
            rule_id: "formula_rule".to_string(),
            rule_name: "Formula".to_string(),
            input: serde_json::json!({
                "formula": formula.source(),
                "variables": variables
            }),
            output: serde_json::json!({ "amount": amount.normalize().to_string() }),
            reasoning: format!("{} = ${}", formula.source(), amount.normalize()),
        },
    })
}

fn conditional_outcome(
    component: &PayrollComponent,
    context: &EvaluationContext,
    conditions: &[Predicate],
    base: Option<&BaseAmount>,
) -> EngineResult<RuleOutcome> {
    let eligibility = check_eligibility(conditions, context);
    let predicates: Vec<String> = conditions.iter().map(ToString::to_string).collect();

    if !eligibility.eligible {
        let failed: Vec<String> = eligibility.failed.iter().map(ToString::to_string).collect();
        return Ok(RuleOutcome {
            amount: Decimal::ZERO,
            eligible: Some(false),
            audit_step: AuditStep {
                step_number: 1,
                rule_id: "conditional_rule".to_string(),
                rule_name: "Conditional Eligibility".to_string(),
                input: serde_json::json!({ "conditions": predicates }),
                output: serde_json::json!({ "eligible": false, "failed": failed, "amount": "0" }),
                reasoning: format!("Not eligible: {} not met", failed.join(", ")),
            },
        });
    }

    let mut outcome = match base {
        Some(BaseAmount::Fixed { value }) => fixed_outcome(*value, Some(true)),
        Some(BaseAmount::Percentage { rate, applies_to }) => {
            percentage_outcome(component, context, *rate, applies_to, Some(true))?
        }
        None => RuleOutcome {
            amount: Decimal::ZERO,
            eligible: Some(true),
            audit_step: AuditStep {
                step_number: 1,
                rule_id: "conditional_rule".to_string(),
                rule_name: "Conditional Eligibility".to_string(),
                input: serde_json::Value::Null,
                output: serde_json::Value::Null,
                reasoning: String::new(),
            },
        },
    };

    let base_reasoning = if base.is_some() {
        outcome.audit_step.reasoning.clone()
    } else {
        "no base amount configured, $0".to_string()
    };
    outcome.audit_step = AuditStep {
        step_number: 1,
        rule_id: "conditional_rule".to_string(),
        rule_name: "Conditional Eligibility".to_string(),
        input: serde_json::json!({
            "conditions": predicates,
            "base": outcome.audit_step.input
        }),
        output: serde_json::json!({
            "eligible": true,
            "amount": outcome.amount.normalize().to_string()
        }),
        reasoning: format!("All conditions met; {base_reasoning}"),
    };

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::Operator;
    use crate::models::{ComponentType, ValidationRules};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn component(id: &str, component_type: ComponentType, rule: CalculationRule) -> PayrollComponent {
        PayrollComponent::new(id, id, component_type, rule)
    }

    fn tenure_bonus(base: Option<BaseAmount>) -> PayrollComponent {
        component(
            "tenure_bonus",
            ComponentType::Bonus,
            CalculationRule::Conditional {
                conditions: vec![
                    Predicate::new("years_of_service", Operator::Gte, 3),
                    Predicate::new("performance_rating", Operator::Eq, "A"),
                ],
                base,
            },
        )
    }

    #[test]
    fn test_fixed_ignores_context() {
        let transport = component(
            "transport",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: dec("300.005") },
        );
        let empty = evaluate(&transport, &EvaluationContext::new());
        let busy = evaluate(
            &transport,
            &EvaluationContext::new().with_value("basic_salary", 5000),
        );

        assert_eq!(empty.amount, dec("300.005"));
        assert_eq!(busy.amount, dec("300.005"));
        assert!(empty.success);
        assert_eq!(empty.audit_steps.len(), 1);
        assert_eq!(empty.audit_steps[0].rule_id, "fixed_rule");
    }

    #[test]
    fn test_percentage_of_base_amount() {
        let allowance = component(
            "allowance",
            ComponentType::Allowance,
            CalculationRule::Percentage {
                rate: dec("10"),
                applies_to: "base_amount".to_string(),
            },
        );
        let result = evaluate(&allowance, &EvaluationContext::new().with_value("base_amount", 5000));

        assert!(result.success);
        assert_eq!(result.amount, dec("500"));
        assert_eq!(result.audit_steps[0].reasoning, "$5000 x 10% = $500");
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let allowance = component(
            "allowance",
            ComponentType::Allowance,
            CalculationRule::Percentage {
                rate: dec("12.5"),
                applies_to: "basic_salary".to_string(),
            },
        );
        let context = EvaluationContext::new().with_value("basic_salary", dec("1234.5"));
        // 154.3125 -> 154.31
        assert_eq!(evaluate(&allowance, &context).amount, dec("154.31"));

        let context = EvaluationContext::new().with_value("basic_salary", dec("0.2"));
        // 0.025 -> 0.03
        assert_eq!(evaluate(&allowance, &context).amount, dec("0.03"));
    }

    #[test]
    fn test_percentage_missing_base_is_missing_input() {
        let housing = component(
            "housing_allowance",
            ComponentType::Allowance,
            CalculationRule::Percentage {
                rate: dec("15"),
                applies_to: "basic_salary".to_string(),
            },
        );
        let result = evaluate(&housing, &EvaluationContext::new().with_employee("emp_001"));

        assert!(!result.success);
        assert_eq!(result.amount, Decimal::ZERO);
        assert_eq!(
            result.error,
            Some(EngineError::MissingInput {
                component_id: "housing_allowance".to_string(),
                employee_id: Some("emp_001".to_string()),
                field: "basic_salary".to_string(),
            })
        );
        assert!(result.audit_steps.is_empty());
    }

    #[test]
    fn test_percentage_non_numeric_base_is_missing_input() {
        let housing = component(
            "housing_allowance",
            ComponentType::Allowance,
            CalculationRule::Percentage {
                rate: dec("15"),
                applies_to: "basic_salary".to_string(),
            },
        );
        let result = evaluate(
            &housing,
            &EvaluationContext::new().with_value("basic_salary", "five thousand"),
        );
        assert!(matches!(result.error, Some(EngineError::MissingInput { .. })));
    }

    #[test]
    fn test_formula_with_service_years() {
        let bonus = component(
            "service_bonus",
            ComponentType::Bonus,
            CalculationRule::Formula {
                formula: Formula::parse("(base_salary * 0.1) + (years_of_service * 100)").unwrap(),
            },
        );
        let context = EvaluationContext::new()
            .with_value("base_salary", 5000)
            .with_value("years_of_service", 5);
        let result = evaluate(&bonus, &context);

        assert!(result.success);
        assert_eq!(result.amount, dec("1000"));
        assert_eq!(result.audit_steps[0].input["variables"]["base_salary"], "5000");
    }

    #[test]
    fn test_formula_result_is_rounded() {
        let daily = component(
            "daily_rate",
            ComponentType::Earning,
            CalculationRule::Formula {
                formula: Formula::parse("basic_salary / 30").unwrap(),
            },
        );
        let result = evaluate(&daily, &EvaluationContext::new().with_value("basic_salary", 1000));
        assert_eq!(result.amount, dec("33.33"));
    }

    #[test]
    fn test_formula_unknown_variable_is_formula_error() {
        let bonus = component(
            "bonus",
            ComponentType::Bonus,
            CalculationRule::Formula {
                formula: Formula::parse("base_salary * 0.1").unwrap(),
            },
        );
        let result = evaluate(&bonus, &EvaluationContext::new().with_employee("emp_002"));

        assert!(!result.success);
        match result.error {
            Some(EngineError::Formula {
                component_id,
                employee_id,
                formula,
                ..
            }) => {
                assert_eq!(component_id, "bonus");
                assert_eq!(employee_id.as_deref(), Some("emp_002"));
                assert_eq!(formula, "base_salary * 0.1");
            }
            other => panic!("expected formula error, got {other:?}"),
        }
    }

    #[test]
    fn test_formula_division_by_zero_is_formula_error() {
        let rate = component(
            "rate",
            ComponentType::Earning,
            CalculationRule::Formula {
                formula: Formula::parse("basic_salary / working_days").unwrap(),
            },
        );
        let context = EvaluationContext::new()
            .with_value("basic_salary", 1000)
            .with_value("working_days", 0);
        let result = evaluate(&rate, &context);
        assert!(matches!(result.error, Some(EngineError::Formula { .. })));
    }

    #[test]
    fn test_conditional_eligible_pays_base() {
        let bonus = tenure_bonus(Some(BaseAmount::Fixed { value: dec("750") }));
        let context = EvaluationContext::new()
            .with_value("years_of_service", 5)
            .with_value("performance_rating", "A");
        let result = evaluate(&bonus, &context);

        assert!(result.success);
        assert_eq!(result.eligible, Some(true));
        assert_eq!(result.amount, dec("750"));
        assert!(result.audit_steps[0].reasoning.starts_with("All conditions met"));
    }

    #[test]
    fn test_conditional_ineligible_pays_zero() {
        let bonus = tenure_bonus(Some(BaseAmount::Fixed { value: dec("750") }))
            .with_validation_rules(ValidationRules {
                max_amount: None,
                requires_approval: true,
                approval_threshold: None,
            });
        let context = EvaluationContext::new()
            .with_value("years_of_service", 2)
            .with_value("performance_rating", "A");
        let result = evaluate(&bonus, &context);

        assert!(result.success);
        assert_eq!(result.eligible, Some(false));
        assert_eq!(result.amount, Decimal::ZERO);
        assert_eq!(result.requires_approval, None);
        assert!(result.audit_steps[0].reasoning.contains("years_of_service >= 3"));
    }

    #[test]
    fn test_conditional_missing_field_is_ineligible() {
        let bonus = tenure_bonus(Some(BaseAmount::Fixed { value: dec("750") }));
        let result = evaluate(&bonus, &EvaluationContext::new().with_value("years_of_service", 5));
        assert!(result.success);
        assert_eq!(result.eligible, Some(false));
    }

    #[test]
    fn test_conditional_eligible_without_base_pays_zero() {
        let bonus = tenure_bonus(None);
        let context = EvaluationContext::new()
            .with_value("years_of_service", 3)
            .with_value("performance_rating", "A");
        let result = evaluate(&bonus, &context);

        assert!(result.success);
        assert_eq!(result.eligible, Some(true));
        assert_eq!(result.amount, Decimal::ZERO);
    }

    #[test]
    fn test_conditional_percentage_base() {
        let bonus = tenure_bonus(Some(BaseAmount::Percentage {
            rate: dec("10"),
            applies_to: "basic_salary".to_string(),
        }));
        let context = EvaluationContext::new()
            .with_value("years_of_service", 4)
            .with_value("performance_rating", "A")
            .with_value("basic_salary", 5000);
        assert_eq!(evaluate(&bonus, &context).amount, dec("500"));

        let context = EvaluationContext::new()
            .with_value("years_of_service", 4)
            .with_value("performance_rating", "A");
        assert!(matches!(
            evaluate(&bonus, &context).error,
            Some(EngineError::MissingInput { .. })
        ));
    }

    #[test]
    fn test_proration_applies_to_prorated_components() {
        let allowance = component(
            "monthly_allowance",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: dec("1000") },
        )
        .prorated();
        let context = EvaluationContext::new()
            .with_period(date(2026, 6, 1), date(2026, 6, 30))
            .with_active_window(date(2026, 6, 16), date(2026, 6, 30));
        let result = evaluate(&allowance, &context);

        assert_eq!(result.amount, dec("1000"));
        assert_eq!(result.prorated_amount, Some(dec("500")));
        assert_eq!(result.effective_amount(), dec("500"));
        assert_eq!(result.audit_steps.len(), 2);
        assert_eq!(result.audit_steps[1].step_number, 2);
        assert_eq!(result.audit_steps[1].rule_id, "proration");
    }

    #[test]
    fn test_proration_overflow_fails_component() {
        let allowance = component(
            "monthly_allowance",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: Decimal::MAX },
        )
        .prorated();
        let context = EvaluationContext::new()
            .with_employee("emp_001")
            .with_period(date(2026, 6, 1), date(2026, 6, 30))
            .with_active_window(date(2026, 6, 16), date(2026, 6, 30));
        let result = evaluate(&allowance, &context);

        assert!(!result.success);
        assert_eq!(result.amount, Decimal::ZERO);
        assert!(matches!(
            result.error,
            Some(EngineError::CalculationError { ref message }) if message.contains("monthly_allowance")
        ));
    }

    #[test]
    fn test_proration_skipped_without_period_or_flag() {
        let prorated = component(
            "monthly_allowance",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: dec("1000") },
        )
        .prorated();
        assert_eq!(evaluate(&prorated, &EvaluationContext::new()).prorated_amount, None);

        let not_prorated = component(
            "monthly_allowance",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: dec("1000") },
        );
        let context = EvaluationContext::new()
            .with_period(date(2026, 6, 1), date(2026, 6, 30))
            .with_active_window(date(2026, 6, 16), date(2026, 6, 30));
        assert_eq!(evaluate(&not_prorated, &context).prorated_amount, None);
    }

    #[test]
    fn test_validation_uses_effective_amount() {
        let bonus = component(
            "performance_bonus",
            ComponentType::Bonus,
            CalculationRule::Fixed { value: dec("6000") },
        )
        .prorated()
        .with_validation_rules(ValidationRules {
            max_amount: Some(dec("10000")),
            requires_approval: true,
            approval_threshold: Some(dec("5000")),
        });

        let result = evaluate(&bonus, &EvaluationContext::new());
        assert_eq!(result.requires_approval, Some(true));
        assert_eq!(result.is_valid, Some(true));

        let context = EvaluationContext::new()
            .with_period(date(2026, 6, 1), date(2026, 6, 30))
            .with_active_window(date(2026, 6, 16), date(2026, 6, 30));
        let result = evaluate(&bonus, &context);
        assert_eq!(result.prorated_amount, Some(dec("3000")));
        assert_eq!(result.requires_approval, Some(false));
        assert_eq!(result.audit_steps.len(), 3);
    }

    #[test]
    fn test_no_validation_fields_without_rules() {
        let transport = component(
            "transport",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: dec("300") },
        );
        let result = evaluate(&transport, &EvaluationContext::new());
        assert_eq!(result.requires_approval, None);
        assert_eq!(result.is_valid, None);
    }

    #[test]
    fn test_tax_flags_pass_through() {
        let mut transport = component(
            "transport",
            ComponentType::Allowance,
            CalculationRule::Fixed { value: dec("300") },
        );
        transport.tax.is_taxable = true;
        transport.tax.tax_category = Some("benefit_in_kind".to_string());

        let result = evaluate(&transport, &EvaluationContext::new());
        assert!(result.is_taxable);
        assert_eq!(result.tax_category.as_deref(), Some("benefit_in_kind"));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let bonus = tenure_bonus(Some(BaseAmount::Percentage {
            rate: dec("7.5"),
            applies_to: "basic_salary".to_string(),
        }));
        let context = EvaluationContext::new()
            .with_employee("emp_001")
            .with_value("years_of_service", 4)
            .with_value("performance_rating", "A")
            .with_value("basic_salary", dec("4321.09"));

        assert_eq!(evaluate(&bonus, &context), evaluate(&bonus, &context));
    }
}
