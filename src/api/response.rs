//! Response types for the payroll engine API.
//!
//! This module defines the response bodies, the error response structure
//! and the mapping from engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::catalog::ComponentVersion;
use crate::config::EngineMetadata;
use crate::error::EngineError;
use crate::models::{EvaluationResult, PayrollComponent, RunSummary};
use crate::run::PayrollRun;

/// Response body for `GET /components`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsResponse {
    /// Catalog metadata.
    pub catalog: EngineMetadata,
    /// The components, in definition order.
    pub components: Vec<PayrollComponent>,
}

/// Response body for `GET /components/:id/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// The component.
    pub component_id: String,
    /// Every version, newest first.
    pub versions: Vec<ComponentVersion>,
}

/// Response body for `POST /evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    /// The requested component's result.
    pub result: EvaluationResult,
    /// The results of the components it depends on, in evaluation order.
    pub dependencies: Vec<EvaluationResult>,
}

/// Response body for `POST /payroll-runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRunResponse {
    /// The processed run.
    pub run: PayrollRun,
    /// Statistics over the run.
    pub summary: RunSummary,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = match &error {
            EngineError::ComponentNotFound { .. } | EngineError::ComponentSetNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            EngineError::MissingInput { .. }
            | EngineError::Formula { .. }
            | EngineError::CyclicDependency { .. }
            | EngineError::UnknownDependency { .. }
            | EngineError::DuplicateComponent { .. }
            | EngineError::DuplicateComponentSet { .. }
            | EngineError::InvalidComponent { .. }
            | EngineError::DependencyFailed { .. }
            | EngineError::RunBlocked { .. }
            | EngineError::InvalidRunTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::CalculationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut subject = Vec::new();
        if let Some(component_id) = error.component_id() {
            subject.push(format!("component '{component_id}'"));
        }
        if let Some(employee_id) = error.employee_id() {
            subject.push(format!("employee '{employee_id}'"));
        }

        let api_error = if subject.is_empty() {
            ApiError::new(error.code(), error.to_string())
        } else {
            ApiError::with_details(error.code(), error.to_string(), subject.join(", "))
        };

        ApiErrorResponse {
            status,
            error: api_error,
        }
    }
}
