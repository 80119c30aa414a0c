//! Custom axum extractors for Peerteam

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::Error;

/// JSON extractor whose rejections use the common error envelope.
///
/// Malformed bodies, wrong shapes, and missing content types all become
/// `422 Invalid request body` with the parser message as details. Field-level
/// validation is left to the handler so each endpoint can word its own failure.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

/// Rejection type for `JsonBody`
#[derive(Debug)]
pub struct JsonBodyRejection(JsonRejection);

impl JsonBodyRejection {
    pub fn into_error(self) -> Error {
        Error::Validation {
            error: "Invalid request body".to_string(),
            details: vec![self.0.body_text()],
        }
    }
}

impl IntoResponse for JsonBodyRejection {
    fn into_response(self) -> Response {
        self.into_error().into_response()
    }
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonBodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(JsonBodyRejection)?;
        Ok(JsonBody(value))
    }
}
