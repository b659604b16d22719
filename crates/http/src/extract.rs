//! Request binding: path ids and JSON bodies.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body that binds to `None` instead of rejecting the request.
///
/// An empty body, a literal `null` and a body that does not deserialize into
/// `T` all bind as absent. Handlers decide where in their checks an absent
/// body turns into a 400, so parent-existence checks can run first.
#[derive(Debug, Clone)]
pub struct OptionalJson<T>(pub Option<T>);

impl<T> OptionalJson<T> {
    /// Unwrap the body or fail with 400.
    pub fn required(self) -> Result<T, AppError> {
        self.0
            .ok_or_else(|| AppError::bad_request("a JSON request body is required"))
    }
}

/// Parse a raw body the way [`OptionalJson`] does.
pub fn bind_json<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice::<Option<T>>(bytes) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "request body did not bind");
            None
        }
    }
}

impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;

        Ok(OptionalJson(bind_json(&bytes)))
    }
}

/// Path parameters that answer 404 with the error envelope when they do
/// not parse, e.g. `/authors/not-an-id`.
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T>(pub T);

impl<S, T> FromRequestParts<S> for IdPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(IdPath(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "path id did not bind");
                Err(AppError::not_found("no resource matches the request path"))
            }
        }
    }
}
