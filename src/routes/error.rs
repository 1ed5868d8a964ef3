use crate::error::AccessError;
use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

/// Every way a request can fail, as seen by an HTTP client.
#[derive(Debug)]
pub enum ApiError {
    Access(AccessError),
    BadRequest(String),
    Multipart(MultipartError),
    /// An extractor refused the request before a handler ran.
    Rejected(StatusCode, String),
    NotFound,
    UnsupportedMediaType(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Access(err) => {
                let status = match err {
                    AccessError::NotFound => StatusCode::NOT_FOUND,
                    AccessError::PasswordRequired | AccessError::InvalidPassword => {
                        StatusCode::UNAUTHORIZED
                    }
                    AccessError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    AccessError::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Multipart(err) => (err.status(), err.body_text()),
            ApiError::Rejected(status, msg) => (*status, msg.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "no such route".to_string()),
            ApiError::UnsupportedMediaType(mime) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("uploading files of type '{mime}' is not permitted"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed: {message}");
        } else {
            debug!("Rejecting request ({status}): {message}");
        }
        (
            status,
            Json(json!({
                "success": false,
                "error": message,
            })),
        )
            .into_response()
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        ApiError::Access(error)
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        ApiError::Multipart(error)
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    ApiError::Rejected(rejection.status(), rejection.body_text())
                }
            }
        )+
    };
}

impl_from_rejection!(
    BytesRejection,
    JsonRejection,
    MultipartRejection,
    PathRejection,
    QueryRejection,
);

/// Answer unknown routes in the same JSON shape as every other failure.
pub async fn fallback_handler() -> ApiError {
    ApiError::NotFound
}
