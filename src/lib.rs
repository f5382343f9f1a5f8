//! Payroll Component Rule Engine
//!
//! This crate evaluates payroll components: compensation and deduction line
//! items whose amounts come from a fixed, percentage, formula or conditional
//! rule, ordered by their dependencies on each other, prorated for partial
//! periods and checked against approval thresholds.
//!
//! The engine is a pure library: callers assemble an
//! [`EvaluationContext`](models::EvaluationContext) per employee and receive
//! [`EvaluationResult`](models::EvaluationResult)s with an audit trail. The
//! [`catalog`], [`run`] and [`api`] modules layer effective-dated component
//! history, payroll runs and an HTTP surface on top.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod run;
pub mod telemetry;
