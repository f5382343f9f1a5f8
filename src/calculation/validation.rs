//! Validation of computed amounts against component thresholds.
//!
//! Exceeding a component's maximum is an expected business outcome that
//! needs a human decision, so it is reported as `is_valid = false` rather
//! than as an error.

use rust_decimal::Decimal;

use crate::models::{AuditStep, PayrollComponent, ValidationOutcome, ValidationRules};

/// Checks an amount against a component's validation rules.
///
/// - `requires_approval` is true iff the rules ask for approval and the
///   amount is at or above `approval_threshold` (every amount, when no
///   threshold is configured).
/// - `is_valid` is false iff `max_amount` is set and the amount exceeds it.
///
/// A component without validation rules never requires approval and is
/// always valid.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::validate;
/// use payroll_engine::models::{
///     CalculationRule, ComponentType, PayrollComponent, ValidationRules,
/// };
/// use rust_decimal::Decimal;
///
/// let component = PayrollComponent::new(
///     "performance_bonus",
///     "Performance Bonus",
///     ComponentType::Bonus,
///     CalculationRule::Fixed { value: Decimal::from(6000) },
/// )
/// .with_validation_rules(ValidationRules {
///     max_amount: Some(Decimal::from(10000)),
///     requires_approval: true,
///     approval_threshold: Some(Decimal::from(5000)),
/// });
///
/// let outcome = validate(&component, Decimal::from(6000));
/// assert!(outcome.requires_approval);
/// assert!(outcome.is_valid);
/// ```
pub fn validate(component: &PayrollComponent, computed_amount: Decimal) -> ValidationOutcome {
    match &component.validation_rules {
        Some(rules) => check_rules(rules, computed_amount),
        None => ValidationOutcome {
            requires_approval: false,
            is_valid: true,
        },
    }
}

fn check_rules(rules: &ValidationRules, amount: Decimal) -> ValidationOutcome {
    let requires_approval = rules.requires_approval
        && rules
            .approval_threshold
            .is_none_or(|threshold| amount >= threshold);
    let is_valid = rules.max_amount.is_none_or(|max| amount <= max);

    ValidationOutcome {
        requires_approval,
        is_valid,
    }
}

/// The result of validating an amount, including the audit step.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// The validation outcome.
    pub outcome: ValidationOutcome,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
}

/// Validates an amount against rules and records the check as an audit step.
pub fn calculate_validation(
    rules: &ValidationRules,
    amount: Decimal,
    step_number: u32,
) -> ValidationResult {
    let outcome = check_rules(rules, amount);

    let mut reasons = Vec::new();
    if outcome.requires_approval {
        match rules.approval_threshold {
            Some(threshold) => reasons.push(format!(
                "${} is at or above the approval threshold ${}",
                amount.normalize(),
                threshold.normalize()
            )),
            None => reasons.push("approval required for every amount".to_string()),
        }
    }
    if let (false, Some(max)) = (outcome.is_valid, rules.max_amount) {
        reasons.push(format!(
            "${} exceeds the maximum ${}",
            amount.normalize(),
            max.normalize()
        ));
    }
    let reasoning = if reasons.is_empty() {
        format!("${} is within limits", amount.normalize())
    } else {
        reasons.join("; ")
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "amount_validation".to_string(),
        rule_name: "Amount Validation".to_string(),
        input: serde_json::json!({
            "amount": amount.normalize().to_string(),
            "max_amount": rules.max_amount.map(|v| v.normalize().to_string()),
            "requires_approval": rules.requires_approval,
            "approval_threshold": rules.approval_threshold.map(|v| v.normalize().to_string())
        }),
        output: serde_json::json!({
            "requires_approval": outcome.requires_approval,
            "is_valid": outcome.is_valid
        }),
        reasoning,
    };

    ValidationResult {
        outcome,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalculationRule, ComponentType};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bonus_with_rules(rules: Option<ValidationRules>) -> PayrollComponent {
        let mut component = PayrollComponent::new(
            "performance_bonus",
            "Performance Bonus",
            ComponentType::Bonus,
            CalculationRule::Fixed {
                value: dec("6000"),
            },
        );
        component.validation_rules = rules;
        component
    }

    fn standard_rules() -> ValidationRules {
        ValidationRules {
            max_amount: Some(dec("10000")),
            requires_approval: true,
            approval_threshold: Some(dec("5000")),
        }
    }

    #[test]
    fn test_above_threshold_requires_approval_and_is_valid() {
        let outcome = validate(&bonus_with_rules(Some(standard_rules())), dec("6000"));
        assert!(outcome.requires_approval);
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_above_maximum_is_invalid() {
        let outcome = validate(&bonus_with_rules(Some(standard_rules())), dec("11000"));
        assert!(outcome.requires_approval);
        assert!(!outcome.is_valid);
    }

    #[test]
    fn test_threshold_is_inclusive_and_maximum_exclusive() {
        let component = bonus_with_rules(Some(standard_rules()));
        assert!(validate(&component, dec("5000")).requires_approval);
        assert!(!validate(&component, dec("4999.99")).requires_approval);
        assert!(validate(&component, dec("10000")).is_valid);
        assert!(!validate(&component, dec("10000.01")).is_valid);
    }

    #[test]
    fn test_threshold_ignored_when_approval_not_required() {
        let rules = ValidationRules {
            requires_approval: false,
            ..standard_rules()
        };
        let outcome = validate(&bonus_with_rules(Some(rules)), dec("6000"));
        assert!(!outcome.requires_approval);
    }

    #[test]
    fn test_approval_without_threshold_applies_to_every_amount() {
        let rules = ValidationRules {
            max_amount: None,
            requires_approval: true,
            approval_threshold: None,
        };
        let outcome = validate(&bonus_with_rules(Some(rules)), dec("1"));
        assert!(outcome.requires_approval);
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_no_rules_is_valid_without_approval() {
        let outcome = validate(&bonus_with_rules(None), dec("1000000"));
        assert!(!outcome.requires_approval);
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_calculate_validation_explains_both_findings() {
        let result = calculate_validation(&standard_rules(), dec("11000"), 3);
        assert_eq!(result.audit_step.step_number, 3);
        assert_eq!(result.audit_step.rule_id, "amount_validation");
        assert!(result.audit_step.reasoning.contains("approval threshold $5000"));
        assert!(result.audit_step.reasoning.contains("exceeds the maximum $10000"));
        assert_eq!(result.audit_step.output["is_valid"], false);
    }

    #[test]
    fn test_calculate_validation_within_limits() {
        let rules = ValidationRules {
            requires_approval: false,
            ..standard_rules()
        };
        let result = calculate_validation(&rules, dec("100"), 1);
        assert!(result.audit_step.reasoning.contains("within limits"));
    }
}
