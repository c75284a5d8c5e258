use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

use gallery_services::drive::DriveError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Configuration { message: String, details: String },
    NotFound { image_id: Option<String> },
    Forbidden { image_id: Option<String> },
    RateLimited { retry_after_secs: u64 },
    Internal { message: String, image_id: Option<String> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    /// Echo the requesting file id back in errors that refer to one.
    pub fn with_image_id(self, id: &str) -> Self {
        match self {
            ApiError::NotFound { .. } => ApiError::NotFound {
                image_id: Some(id.to_string()),
            },
            ApiError::Forbidden { .. } => ApiError::Forbidden {
                image_id: Some(id.to_string()),
            },
            ApiError::Internal { message, .. } => ApiError::Internal {
                message,
                image_id: Some(id.to_string()),
            },
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, error, image_id, retry_after, details) = match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg, None, None, None)
            }
            ApiError::Configuration { message, details } => (
                StatusCode::BAD_REQUEST,
                "CONFIGURATION_ERROR",
                message,
                None,
                None,
                Some(details),
            ),
            ApiError::NotFound { image_id } => (
                StatusCode::NOT_FOUND,
                "IMAGE_NOT_FOUND",
                "Image not found".to_string(),
                image_id,
                None,
                None,
            ),
            ApiError::Forbidden { image_id } => (
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "Access denied".to_string(),
                image_id,
                None,
                None,
            ),
            ApiError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                "Service temporarily unavailable".to_string(),
                None,
                Some(retry_after_secs),
                None,
            ),
            ApiError::Internal { message, image_id } => {
                // Upstream detail stays in the server log.
                tracing::error!(error = %message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                    image_id,
                    None,
                    None,
                )
            }
        };

        let timestamp = (status == StatusCode::INTERNAL_SERVER_ERROR)
            .then(|| Utc::now().to_rfc3339());

        let body = ErrorResponse {
            error,
            code: code.to_string(),
            image_id,
            retry_after,
            timestamp,
            details,
        };

        let mut response = (status, Json(body)).into_response();
        // Never let an error response get cached.
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<DriveError> for ApiError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::Configuration(msg) => ApiError::Internal {
                message: msg,
                image_id: None,
            },
            DriveError::NotFound => ApiError::NotFound { image_id: None },
            DriveError::PermissionDenied => ApiError::Forbidden { image_id: None },
            DriveError::RateLimited { retry_after_secs } => {
                ApiError::RateLimited { retry_after_secs }
            }
            DriveError::Upstream(msg) => ApiError::Internal {
                message: msg,
                image_id: None,
            },
        }
    }
}
