//! Conditional responses for the read endpoints.
//!
//! Every body is served with an `ETag` (its fingerprint) and a
//! `Cache-Control` freshness window. A request whose `If-None-Match` equals
//! the current fingerprint gets a bodiless 304 carrying the same headers.

use axum::{
    http::{
        header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use ratesync_crypto::{cache_control, fingerprint, matches};
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::metrics::Metrics;

/// Cache headers for a payload with fingerprint `etag`.
pub fn cache_headers(etag: &str, ttl_secs: u64) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ETAG,
        HeaderValue::from_str(etag).map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_str(&cache_control(ttl_secs))
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    Ok(headers)
}

/// Serve `payload` as JSON, or 304 when the client already holds it.
pub fn conditional_json<T: Serialize>(
    request_headers: &HeaderMap,
    payload: &T,
    ttl_secs: u64,
    metrics: &Metrics,
) -> ApiResult<Response> {
    let etag = fingerprint(payload)?;
    let headers = cache_headers(&etag, ttl_secs)?;

    let client_token = request_headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());

    if matches(client_token, &etag) {
        debug!(etag = %etag, "ETag match, returning 304");
        metrics.not_modified();
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    metrics.full_response();
    Ok((StatusCode::OK, headers, Json(payload)).into_response())
}
