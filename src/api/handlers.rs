//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::run::PayrollRun;

use super::request::{AsOfQuery, EvaluateRequest, PayrollRunRequest};
use super::response::{
    ApiError, ApiErrorResponse, ComponentsResponse, EvaluateResponse, HistoryResponse,
    PayrollRunResponse,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/components", get(list_components_handler))
        .route("/components/report", get(report_handler))
        .route("/components/:id/history", get(history_handler))
        .route("/evaluate", post(evaluate_handler))
        .route("/payroll-runs", post(payroll_run_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(error: impl Into<ApiErrorResponse>) -> Response {
    let api_error: ApiErrorResponse = error.into();
    json_response(api_error.status, api_error.error)
}

/// Turns a JSON extraction failure into a 400 response.
fn rejection_response(rejection: JsonRejection, correlation_id: Uuid) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    error_response(ApiErrorResponse::bad_request(error))
}

/// Handler for GET /components.
///
/// Returns the latest version of every component, or the versions in effect
/// on the `as_of` query date.
async fn list_components_handler(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> Response {
    let catalog = state.catalog();
    let components = match query.as_of {
        Some(date) => catalog.snapshot_as_of(date),
        None => catalog.components().into_iter().cloned().collect(),
    };

    json_response(
        StatusCode::OK,
        ComponentsResponse {
            catalog: state.config().metadata().clone(),
            components,
        },
    )
}

/// Handler for GET /components/report.
async fn report_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.catalog().report())
}

/// Handler for GET /components/:id/history.
async fn history_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.catalog().history(&id) {
        Ok(versions) => json_response(
            StatusCode::OK,
            HistoryResponse {
                component_id: id,
                versions: versions.into_iter().cloned().collect(),
            },
        ),
        Err(err) => error_response(err),
    }
}

/// Handler for POST /evaluate.
///
/// Evaluates the requested component after the components it depends on,
/// all in the request's context.
async fn evaluate_handler(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing evaluation request");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let start_time = Instant::now();
    let catalog = state.catalog();
    let plan = match request.as_of {
        Some(date) => catalog.plan_as_of(date),
        None => catalog.latest_plan(),
    };
    let results = plan.and_then(|plan| {
        plan.evaluate_with_dependencies(&request.component_id, &request.context)
    });

    let mut results = match results {
        Ok(results) => results,
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                component_id = %request.component_id,
                error = %err,
                "Evaluation failed"
            );
            return error_response(err);
        }
    };

    let Some(result) = results.pop() else {
        return error_response(EngineError::CalculationError {
            message: format!("no result produced for '{}'", request.component_id),
        });
    };

    if let Some(err) = result.error.clone() {
        warn!(
            correlation_id = %correlation_id,
            component_id = %request.component_id,
            error = %err,
            "Component evaluation failed"
        );
        return error_response(err);
    }

    info!(
        correlation_id = %correlation_id,
        component_id = %result.component_id,
        amount = %result.effective_amount(),
        dependencies = results.len(),
        duration_us = start_time.elapsed().as_micros(),
        "Evaluation completed successfully"
    );
    json_response(
        StatusCode::OK,
        EvaluateResponse {
            result,
            dependencies: results,
        },
    )
}

/// Handler for POST /payroll-runs.
///
/// Creates a run for the pay period and processes every employee against
/// the components in effect on the last day of the period.
async fn payroll_run_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayrollRunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll run request");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    if let Err(message) = request.validate() {
        warn!(correlation_id = %correlation_id, error = %message, "Invalid payroll run request");
        return error_response(ApiErrorResponse::bad_request(ApiError::validation_error(
            message,
        )));
    }

    let start_time = Instant::now();
    let plan = match state.catalog().plan_as_of(request.period_end) {
        Ok(plan) => Arc::new(plan),
        Err(err) => return error_response(err),
    };

    let now = Utc::now();
    let mut run = PayrollRun::new(
        request.period_start,
        request.period_end,
        request.created_by.clone(),
        now,
    );
    if let Err(err) = run
        .process(plan, request.employees, &request.created_by, now)
        .await
    {
        warn!(correlation_id = %correlation_id, error = %err, "Payroll run failed");
        return error_response(err);
    }

    let summary = match run.summary() {
        Ok(summary) => summary,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Payroll run summary failed");
            return error_response(err);
        }
    };
    info!(
        correlation_id = %correlation_id,
        run_id = %run.id,
        employees = summary.employee_count,
        gross_pay = %summary.totals.gross_pay,
        failures = summary.failure_count,
        duration_us = start_time.elapsed().as_micros(),
        "Payroll run processed"
    );
    json_response(StatusCode::CREATED, PayrollRunResponse { run, summary })
}
