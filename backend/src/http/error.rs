//! HTTP error handling and response types.
//!
//! Invalid input and empty results both answer 402, which existing clients
//! rely on; the `code` member tells them apart. Store failures answer 500.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::services::GatewayError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message
    #[serde(rename = "error")]
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Payload or parameters refused
    InvalidInput {
        message: String,
        details: Option<String>,
    },
    /// Filtered read matched nothing
    NotFound(String),
    /// Store failure
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } | AppError::NotFound(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::InvalidInput { message, details } => {
                let error = ApiError::new("INVALID_INPUT", message);
                match details {
                    Some(d) => error.with_details(d),
                    None => error,
                }
            }
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::Internal(msg) => ApiError::new("STORE_UNAVAILABLE", msg),
        };

        (status, Json(error)).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        let details = err.rejection().map(ToString::to_string);
        let text = err.to_string();
        match err {
            GatewayError::InvalidCommand(_) | GatewayError::InvalidEntry(_) => {
                AppError::InvalidInput {
                    message: text,
                    details,
                }
            }
            GatewayError::InvalidQuery(message) => AppError::InvalidInput {
                message,
                details: None,
            },
            GatewayError::NotFound(message) => AppError::NotFound(message),
            GatewayError::StoreUnavailable { message, source } => {
                warn!(error = %source, "store unavailable");
                AppError::Internal(message)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput {
            message: "Request body must be a JSON array of objects.".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput {
            message: "Invalid query parameters.".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}
