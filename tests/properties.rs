//! Property tests for the evaluation stages.
//!
//! These check invariants that must hold for any input, not just the
//! hand-picked cases in the unit tests.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use payroll_engine::calculation::{Formula, evaluate, prorate, validate};
use payroll_engine::models::{
    CalculationRule, ComponentType, EvaluationContext, PayrollComponent, ValidationRules,
};

fn june(day: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1)
        .unwrap()
        .checked_add_days(Days::new(day))
        .unwrap()
}

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn fixed(value: Decimal) -> PayrollComponent {
    PayrollComponent::new(
        "transport",
        "Transport Allowance",
        ComponentType::Allowance,
        CalculationRule::Fixed { value },
    )
}

proptest! {
    #[test]
    fn fixed_amount_ignores_context(
        value in 0i64..100_000_000,
        salary in 0i64..100_000_000,
        years in 0i32..50,
    ) {
        let component = fixed(cents(value));
        let context = EvaluationContext::new()
            .with_value("base_salary", cents(salary))
            .with_value("years_of_service", years);

        let with_context = evaluate(&component, &context);
        let without_context = evaluate(&component, &EvaluationContext::new());

        prop_assert!(with_context.success);
        prop_assert_eq!(with_context.amount, cents(value));
        prop_assert_eq!(with_context.amount, without_context.amount);
    }

    #[test]
    fn evaluation_is_idempotent(
        salary in 0i64..100_000_000,
        rate in 0i64..10_000,
        years in 0i32..50,
    ) {
        let percentage = PayrollComponent::new(
            "housing",
            "Housing Allowance",
            ComponentType::Allowance,
            CalculationRule::Percentage {
                rate: cents(rate),
                applies_to: "base_salary".to_string(),
            },
        );
        let formula = PayrollComponent::new(
            "service_bonus",
            "Service Bonus",
            ComponentType::Bonus,
            CalculationRule::Formula {
                formula: Formula::parse("base_salary * 0.1 + years_of_service * 100").unwrap(),
            },
        );
        let context = EvaluationContext::new()
            .with_value("base_salary", cents(salary))
            .with_value("years_of_service", years);

        for component in [&percentage, &formula] {
            let first = evaluate(component, &context);
            let second = evaluate(component, &context);
            prop_assert!(first.success);
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn prorated_amount_stays_within_bounds(
        amount in 0i64..100_000_000,
        start in 0u64..29,
        length in 0u64..29,
    ) {
        let active_start = june(start);
        let active_end = june((start + length).min(29));
        let prorated = prorate(cents(amount), active_start, active_end, june(0), june(29)).unwrap();

        prop_assert!(prorated >= Decimal::ZERO);
        prop_assert!(prorated <= cents(amount));
    }

    #[test]
    fn active_window_outside_period_prorates_to_zero(
        amount in 0i64..100_000_000,
        offset in 30u64..90,
    ) {
        let prorated = prorate(cents(amount), june(offset), june(offset + 5), june(0), june(29));
        prop_assert_eq!(prorated, Some(Decimal::ZERO));
    }

    #[test]
    fn validity_is_monotonic_in_amount(
        max in 0i64..10_000_000,
        lower in 0i64..10_000_000,
        delta in 0i64..10_000_000,
    ) {
        let component = fixed(Decimal::ZERO).with_validation_rules(ValidationRules {
            max_amount: Some(cents(max)),
            requires_approval: true,
            approval_threshold: Some(cents(max / 2)),
        });
        let smaller = validate(&component, cents(lower));
        let larger = validate(&component, cents(lower + delta));

        // A larger amount is never more valid, and never needs less approval.
        prop_assert!(larger.is_valid <= smaller.is_valid);
        prop_assert!(larger.requires_approval >= smaller.requires_approval);
    }
}
