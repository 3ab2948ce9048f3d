use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, TimeZone, Utc};

use crate::config::Config;
use crate::error::ApiError;

/// Header carrying a fake current time, in Unix epoch milliseconds.
/// Only honored when `test_mode` is enabled.
pub const TEST_NOW_HEADER: &str = "x-test-now-ms";

/// The single instant a request is evaluated at.
#[derive(Debug, Clone, Copy)]
pub struct RequestTime(pub DateTime<Utc>);

#[async_trait]
impl<S> FromRequestParts<S> for RequestTime
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Config::from_ref(state);
        now_from_headers(&parts.headers, config.test_mode).map(RequestTime)
    }
}

fn now_from_headers(headers: &HeaderMap, test_mode: bool) -> crate::ApiResult<DateTime<Utc>> {
    if !test_mode {
        return Ok(Utc::now());
    }

    let Some(value) = headers.get(TEST_NOW_HEADER) else {
        return Ok(Utc::now());
    };

    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .ok_or_else(|| ApiError::InvalidInput(format!("bad {TEST_NOW_HEADER} header")))
}
