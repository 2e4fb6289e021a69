//! HTTP error responses for the web adapter.
//!
//! Every failure leaves the server as `{"kind": ..., "message": ...}` with a
//! status chosen from the domain error.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::error::CashCrashError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    message: &'a str,
}

impl WebError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFound", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BadRequest", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal", message)
    }
}

pub fn status_from_error(err: &CashCrashError) -> StatusCode {
    match err {
        CashCrashError::InvalidQuantity { .. }
        | CashCrashError::InvalidPrice { .. }
        | CashCrashError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        CashCrashError::InstrumentNotFound { .. } | CashCrashError::TeamNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        CashCrashError::InsufficientFunds { .. } | CashCrashError::InsufficientHoldings { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CashCrashError::AccessCodeTaken | CashCrashError::InstrumentInUse { .. } => {
            StatusCode::CONFLICT
        }
        CashCrashError::ConfigParse { .. }
        | CashCrashError::ConfigMissing { .. }
        | CashCrashError::ConfigInvalid { .. }
        | CashCrashError::Seed { .. }
        | CashCrashError::Internal { .. }
        | CashCrashError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CashCrashError> for WebError {
    fn from(err: CashCrashError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self::new(status, err.kind(), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            kind: self.kind,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}
