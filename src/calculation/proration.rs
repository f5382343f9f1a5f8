//! Partial-period proration.
//!
//! This module scales a component amount to the part of a pay period during
//! which the component was active, using inclusive day counts: a component
//! active from the 16th to the 30th of a 30-day month receives 15/30 of its
//! amount.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::AuditStep;

use super::round_currency;

/// Returns the number of days from `start` to `end`, both inclusive.
///
/// Returns zero when `end` is before `start`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        0
    } else {
        (end - start).num_days() + 1
    }
}

/// Returns the number of days, inclusive, that two windows share.
pub fn overlap_days(
    first_start: NaiveDate,
    first_end: NaiveDate,
    second_start: NaiveDate,
    second_end: NaiveDate,
) -> i64 {
    inclusive_days(first_start.max(second_start), first_end.min(second_end))
}

/// Prorates an amount to the days the component was active within the full period.
///
/// `prorated = amount * active_days / total_days`, rounded half-up to two
/// decimals. No overlap (including a component that starts after the period
/// ends) yields zero; an empty or inverted full period yields zero as well.
/// Returns `None` if the amount is too large to scale.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::prorate;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let d = |day| NaiveDate::from_ymd_opt(2026, 6, day).unwrap();
/// let prorated = prorate(Decimal::from(1000), d(16), d(30), d(1), d(30));
/// assert_eq!(prorated, Some(Decimal::from(500)));
/// ```
pub fn prorate(
    amount: Decimal,
    component_period_start: NaiveDate,
    component_period_end: NaiveDate,
    full_period_start: NaiveDate,
    full_period_end: NaiveDate,
) -> Option<Decimal> {
    let total_days = inclusive_days(full_period_start, full_period_end);
    if total_days == 0 {
        return Some(Decimal::ZERO);
    }

    let active_days = overlap_days(
        component_period_start,
        component_period_end,
        full_period_start,
        full_period_end,
    );
    if active_days == total_days {
        return Some(amount);
    }

    amount
        .checked_mul(Decimal::from(active_days))
        .and_then(|scaled| scaled.checked_div(Decimal::from(total_days)))
        .map(round_currency)
}

/// The result of prorating an amount, including the audit step.
#[derive(Debug, Clone)]
pub struct ProrationResult {
    /// The prorated amount.
    pub prorated_amount: Decimal,
    /// Days the component was active within the period.
    pub active_days: i64,
    /// Days in the full period.
    pub total_days: i64,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Prorates an amount and records the calculation as an audit step.
///
/// Returns `None` when [`prorate`] overflows.
///
/// # Arguments
///
/// * `amount` - The full-period amount
/// * `active` - The component's active window (inclusive)
/// * `period` - The full pay period (inclusive)
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_proration(
    amount: Decimal,
    active: (NaiveDate, NaiveDate),
    period: (NaiveDate, NaiveDate),
    step_number: u32,
) -> Option<ProrationResult> {
    let total_days = inclusive_days(period.0, period.1);
    let active_days = overlap_days(active.0, active.1, period.0, period.1);
    let prorated_amount = prorate(amount, active.0, active.1, period.0, period.1)?;

    let reasoning = if active_days == total_days {
        format!(
            "Active for the full period ({} days) - ${} unchanged",
            total_days,
            amount.normalize()
        )
    } else {
        format!(
            "${} x {}/{} days = ${}",
            amount.normalize(),
            active_days,
            total_days,
            prorated_amount.normalize()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "proration".to_string(),
        rule_name: "Partial Period Proration".to_string(),
        input: serde_json::json!({
            "amount": amount.normalize().to_string(),
            "active_start": active.0,
            "active_end": active.1,
            "period_start": period.0,
            "period_end": period.1
        }),
        output: serde_json::json!({
            "active_days": active_days,
            "total_days": total_days,
            "prorated_amount": prorated_amount.normalize().to_string()
        }),
        reasoning,
    };

    Some(ProrationResult {
        prorated_amount,
        active_days,
        total_days,
        audit_step,
    })
}
