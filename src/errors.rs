use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::Value;
use thiserror::Error;

use crate::models::upload::ErrorResponse;

pub const TIMEOUT_ERROR: &str = "Connect Timeout Error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing {0}")]
    MissingField(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Server configuration error - {error}")]
    Configuration { error: String, details: String },
    #[error("{error}")]
    Unauthorized {
        error: String,
        details: String,
        debug: Option<Value>,
    },
    #[error("{error}")]
    ValidationRejected {
        status: u16,
        error: String,
        details: String,
        debug: Option<Value>,
    },
    #[error("upload to {endpoint} timed out after {timeout_ms}ms")]
    GatewayTimeout { endpoint: String, timeout_ms: u64 },
    #[error("network error: {0}")]
    Network(String),
    #[error("{error}")]
    Upstream {
        status: u16,
        error: String,
        details: String,
        debug: Option<Value>,
    },
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn details(&self) -> Option<String> {
        match self {
            ApiError::MissingField(field) => Some(format!("Request body must include {field}")),
            ApiError::InvalidPayload(_) => {
                Some("fileData must be base64 or a data URL holding a non-empty image".into())
            }
            ApiError::Configuration { details, .. }
            | ApiError::Unauthorized { details, .. }
            | ApiError::ValidationRejected { details, .. }
            | ApiError::Upstream { details, .. } => Some(details.clone()),
            ApiError::Network(msg) => Some(format!(
                "Could not reach the storage endpoint, the request may be retried: {msg}"
            )),
            ApiError::GatewayTimeout { .. } | ApiError::MethodNotAllowed | ApiError::Internal => {
                None
            }
        }
    }

    fn debug(&self) -> Option<Value> {
        match self {
            ApiError::Unauthorized { debug, .. }
            | ApiError::ValidationRejected { debug, .. }
            | ApiError::Upstream { debug, .. } => debug.clone(),
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        let upstream = |status: u16| {
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        };
        match self {
            ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::ValidationRejected { status, .. } => upstream(*status),
            ApiError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { status, .. } => upstream(*status),
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::GatewayTimeout { .. } => ErrorResponse {
                error: TIMEOUT_ERROR.into(),
                details: None,
                message: Some(self.to_string()),
                debug: None,
            },
            ApiError::Network(_) => ErrorResponse {
                error: "Failed to process upload".into(),
                details: self.details(),
                message: Some(self.to_string()),
                debug: None,
            },
            _ => ErrorResponse {
                error: self.to_string(),
                details: self.details(),
                message: None,
                debug: self.debug(),
            },
        };
        let status = self.status_code();
        crate::sentry::report(self, status.as_u16());
        HttpResponse::build(status).json(body)
    }
}
