//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Cacheable GET
//! handlers go through [`cached_response`] so the `X-Cache-Status` header
//! is always set.

use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use loyalty_cache::{Cached, CACHE_STATUS_HEADER};
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Wrap a gate result in the data envelope and tag it with its cache status.
pub fn cached_response<T: Serialize>(cached: Cached<T>) -> Response {
    let mut response = Json(DataResponse { data: cached.value }).into_response();
    response.headers_mut().insert(
        HeaderName::from_static(CACHE_STATUS_HEADER),
        HeaderValue::from_static(cached.status.as_str()),
    );
    response
}
