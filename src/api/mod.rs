//! HTTP API module for the payroll engine.
//!
//! This module exposes the component catalog, single-component evaluation
//! and payroll run processing as JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AsOfQuery, EvaluateRequest, PayrollRunRequest};
pub use response::{
    ApiError, ApiErrorResponse, ComponentsResponse, EvaluateResponse, HistoryResponse,
    PayrollRunResponse,
};
pub use state::AppState;
