use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Request body decoded from either JSON or an urlencoded form.
///
/// A JSON body has to be an object. Failures are answered with a plain-text
/// `400 Bad Request`.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if content_type.is_empty() {
            return Err(ApiError::bad_request("missing content-type!"));
        }

        if content_type.starts_with("application/json") {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
            let value: serde_json::Value = serde_json::from_slice(&bytes)
                .map_err(|err| ApiError::bad_request(format!("invalid json data: {err}")))?;
            let Some(object) = value.as_object() else {
                return Err(ApiError::bad_request(
                    "invalid json data, json body must be object.",
                ));
            };
            // Values may hold credentials; only the keys are logged.
            let fields: Vec<&str> = object.keys().map(String::as_str).collect();
            tracing::debug!(?fields, "request json");
            let data = serde_json::from_value(value)
                .map_err(|err| ApiError::bad_request(err.to_string()))?;
            return Ok(Self(data));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(data) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
            return Ok(Self(data));
        }

        Err(ApiError::bad_request(format!(
            "Unsupported content-type: {content_type}"
        )))
    }
}
