//! Performance benchmarks for the payroll engine.
//!
//! This benchmark suite covers the hot paths of a payroll run:
//! - Evaluating a single component
//! - Evaluating the full standard catalog for one employee
//! - Processing batches of employees concurrently
//! - A single evaluation through the HTTP API
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use payroll_engine::api::{AppState, create_router};
use payroll_engine::calculation::evaluate;
use payroll_engine::config::ConfigLoader;
use payroll_engine::models::EvaluationContext;
use payroll_engine::run::{EmployeeInput, EvaluationPlan, process_employees};

use axum::{body::Body, http::Request};
use tower::ServiceExt;

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/standard").expect("Failed to load config")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Creates the June plan from the standard catalog.
fn create_plan() -> Arc<EvaluationPlan> {
    let config = load_config();
    Arc::new(config.catalog().plan_as_of(date(2026, 6, 30)).unwrap())
}

/// Creates a June context for an employee; every fifth employee joins mid-month.
fn create_context(index: usize) -> EvaluationContext {
    let context = EvaluationContext::new()
        .with_value("base_salary", 4000 + (index as i64 % 20) * 250)
        .with_value("years_of_service", (index % 12) as i64)
        .with_value("performance_rating", if index % 2 == 0 { "A" } else { "B" })
        .with_period(date(2026, 6, 1), date(2026, 6, 30));

    if index % 5 == 0 {
        EvaluationContext {
            active_start: Some(date(2026, 6, 16)),
            ..context
        }
    } else {
        context
    }
}

fn create_inputs(count: usize) -> Vec<EmployeeInput> {
    (0..count)
        .map(|i| EmployeeInput::new(format!("emp_bench_{i:04}"), create_context(i)))
        .collect()
}

/// Benchmark: One component, no dependencies.
fn bench_single_component(c: &mut Criterion) {
    let plan = create_plan();
    let component = plan.component("service_bonus").unwrap().clone();
    let mut context = create_context(1);
    context.insert_component_amount("basic_salary", rust_decimal::Decimal::from(5000));

    c.bench_function("single_component", |b| {
        b.iter(|| black_box(evaluate(black_box(&component), black_box(&context))))
    });
}

/// Benchmark: Every catalog component for one employee.
fn bench_single_employee(c: &mut Criterion) {
    let plan = create_plan();
    let input = EmployeeInput::new("emp_bench_0001", create_context(1));

    c.bench_function("single_employee", |b| {
        b.iter(|| black_box(plan.evaluate_employee(black_box(&input))))
    });
}

/// Benchmark: Concurrent batches of employees.
fn bench_batches(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let plan = create_plan();

    let mut group = c.benchmark_group("batch_processing");

    for count in [10usize, 100, 1000] {
        let inputs = create_inputs(count);
        group.throughput(Throughput::Elements(count as u64));
        if count >= 1000 {
            // Reduce sample size for large batches to keep benchmark time reasonable
            group.sample_size(10);
        }
        group.bench_with_input(BenchmarkId::new("employees", count), &inputs, |b, inputs| {
            b.to_async(&rt).iter(|| async {
                let calculations = process_employees(Arc::clone(&plan), inputs.clone()).await;
                black_box(calculations)
            })
        });
    }

    group.finish();
}

/// Benchmark: POST /evaluate through the router.
fn bench_http_evaluate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(AppState::new(load_config()));
    let body = serde_json::json!({
        "component_id": "service_bonus",
        "context": {
            "values": { "base_salary": 5000, "years_of_service": 5 },
            "period_start": "2026-06-01",
            "period_end": "2026-06-30"
        }
    })
    .to_string();

    c.bench_function("http_evaluate", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/evaluate")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

criterion_group!(
    benches,
    bench_single_component,
    bench_single_employee,
    bench_batches,
    bench_http_evaluate,
);
criterion_main!(benches);
