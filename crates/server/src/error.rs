//! API error type: every failure leaves as `{"error": message}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use healthtrack_core::Error;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::error;

/// Result type of every handler
pub type ApiResult<T> = Result<T, ApiError>;

/// Message shown for storage-class failures outside development mode.
pub const GENERIC_SERVER_ERROR: &str = "Server error";

/// Which route group produced the error.
///
/// Credential failures are 401 for patients and 400 for users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// `/api/patients`
    Patients,
    /// `/api/records`
    Records,
    /// `/api/users`
    Users,
}

/// An HTTP status plus the message placed in the body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 400 with a fixed message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Convert a service error.
    ///
    /// Storage-class detail is replaced by [`GENERIC_SERVER_ERROR`] unless
    /// `expose_internal` is set.
    pub fn from_core(err: Error, surface: Surface, expose_internal: bool) -> Self {
        let status = match &err {
            Error::ValidationFailed { .. }
            | Error::MalformedIdentity { .. }
            | Error::EmptyPatch
            | Error::DuplicateContact { .. }
            | Error::DuplicateEmail { .. }
            | Error::NoValidRecords => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidCredentials => match surface {
                Surface::Patients => StatusCode::UNAUTHORIZED,
                Surface::Records | Surface::Users => StatusCode::BAD_REQUEST,
            },
            Error::StorageFailure(_) | Error::Io(_) | Error::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = if err.is_client_error() || expose_internal {
            err.to_string()
        } else {
            error!(target: "healthtrack::http", ?surface, error = %err, "Request failed");
            GENERIC_SERVER_ERROR.to_string()
        };
        Self { status, message }
    }

    /// HTTP status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// Decode a JSON body into `T`, mapping both transport and schema problems
/// to 400.
pub fn parse_body<T: DeserializeOwned>(body: Result<Json<Value>, JsonRejection>) -> ApiResult<T> {
    let Json(value) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(e.to_string()))
}
