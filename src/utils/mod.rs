//! Response helpers shared by the resource modules.

use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Location of a child resource of the request path, e.g. the book created
/// by `POST /api/authors/{author_id}/books`.
pub fn child_location(request: &Uri, segment: impl std::fmt::Display) -> String {
    format!("{}/{}", request.path().trim_end_matches('/'), segment)
}

/// `201 Created` with a `Location` header and the created representation.
pub fn created<T: Serialize>(location: String, body: T) -> Response {
    (StatusCode::CREATED, [(header::LOCATION, location)], Json(body)).into_response()
}
