use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quill_orm::OrmError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors reported to API clients.
///
/// Everything but [`ApiError::BadRequest`] is rendered as
/// `{"error": "<kind>", "data": "<field>", "message": "<text>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Invalid { field: String, message: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{message}")]
    RegisterFailed { field: String, message: String },
    #[error("{message}")]
    SigninFailed { field: String, message: String },
    /// Malformed request body, answered as plain text.
    #[error("{0}")]
    BadRequest(String),
    #[error("database error")]
    Database(#[from] OrmError),
    /// Server-side failure outside the database; the detail is only logged.
    #[error("internal error")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    data: &'a str,
    message: String,
}

impl ApiError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(field: impl Into<String>) -> Self {
        Self::NotFound(field.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Permission denied.".to_owned())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "value:invalid",
            Self::NotFound(_) => "value:notfound",
            Self::Forbidden(_) => "permission:forbidden",
            Self::RegisterFailed { .. } => "register:failed",
            Self::SigninFailed { .. } => "signin:failed",
            Self::BadRequest(_) => "request:invalid",
            Self::Database(_) | Self::Internal(_) => "internal:error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Invalid { .. }
            | Self::RegisterFailed { .. }
            | Self::SigninFailed { .. }
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::BadRequest(message) = self {
            return (status, message).into_response();
        }
        match &self {
            Self::Database(err) => tracing::error!(error = %err, "request failed"),
            Self::Internal(detail) => tracing::error!(error = %detail, "request failed"),
            _ => {}
        }

        let data = match &self {
            Self::Invalid { field, .. }
            | Self::RegisterFailed { field, .. }
            | Self::SigninFailed { field, .. } => field.as_str(),
            Self::NotFound(field) => field.as_str(),
            _ => "",
        };
        let body = ErrorBody {
            error: self.kind(),
            data,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn api_errors_render_kind_field_and_message() {
        let (status, body) = body_of(ApiError::invalid("name", "name cannot be empty.")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            r#"{"error":"value:invalid","data":"name","message":"name cannot be empty."}"#
        );

        let (status, body) = body_of(ApiError::not_found("blog")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains(r#""error":"value:notfound""#));
    }

    #[tokio::test]
    async fn bad_requests_are_plain_text() {
        let (status, body) = body_of(ApiError::bad_request("missing content-type!")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "missing content-type!");
    }

    #[tokio::test]
    async fn database_errors_hide_details() {
        let (status, body) = body_of(OrmError::MissingColumn("secret".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("secret"));

        let (status, body) = body_of(ApiError::Internal("hmac key".to_owned())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains(r#""error":"internal:error""#));
        assert!(!body.contains("hmac key"));
    }
}
