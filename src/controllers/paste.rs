use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::info;

use crate::db::{Database, NewPaste};
use crate::error::ApiError;
use crate::id::generate_id;
use crate::models::{Paste, PasteView};
use crate::types::api::CreatePaste;

/// Validated parameters for creating a paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub content: String,
    pub ttl_seconds: Option<u64>,
    pub max_views: Option<u64>,
}

impl TryFrom<CreatePaste> for CreateParams {
    type Error = ApiError;

    fn try_from(request: CreatePaste) -> Result<Self, Self::Error> {
        let content = match request.content {
            Some(Value::String(content)) => content,
            Some(Value::Null) | None => {
                return Err(ApiError::InvalidInput("content is required".into()))
            }
            Some(_) => return Err(ApiError::InvalidInput("content must be a string".into())),
        };

        Ok(CreateParams {
            content,
            ttl_seconds: parse_count("ttl_seconds", request.ttl_seconds)?,
            max_views: parse_count("max_views", request.max_views)?,
        })
    }
}

/// Parse an optional non-negative integer given either as a JSON number or as
/// a decimal string.
fn parse_count(field: &str, value: Option<Value>) -> crate::ApiResult<Option<u64>> {
    let invalid = || ApiError::InvalidInput(format!("{field} must be a non-negative integer"));

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Create a paste. Its expiry, if any, is measured from `now`.
pub async fn create(
    db: &Database,
    params: CreateParams,
    now: DateTime<Utc>,
) -> crate::ApiResult<Paste> {
    if params.content.trim().is_empty() {
        return Err(ApiError::InvalidInput("content is required".into()));
    }

    let expires_at = params
        .ttl_seconds
        .map(|ttl| {
            i64::try_from(ttl)
                .ok()
                .and_then(|secs| secs.checked_mul(1000))
                .and_then(|millis| now.checked_add_signed(Duration::milliseconds(millis)))
                .ok_or_else(|| ApiError::InvalidInput("ttl_seconds is too large".into()))
        })
        .transpose()?;

    let max_views = params
        .max_views
        .map(|max_views| {
            i64::try_from(max_views)
                .map_err(|_| ApiError::InvalidInput("max_views is too large".into()))
        })
        .transpose()?;

    let id = generate_id();

    info!(
        "new paste: id='{id}', size={size}, ttl={ttl:?}, max_views={max_views:?}",
        size = params.content.len(),
        ttl = params.ttl_seconds,
    );

    db.insert_paste(NewPaste {
        id: &id,
        content: &params.content,
        created_at: now,
        expires_at,
        max_views,
    })
    .await
}

/// Retrieve a paste and count the view, as one atomic step.
///
/// Absent, timed out and exhausted pastes all come back as `NotFound`.
pub async fn retrieve(
    db: &Database,
    id: &str,
    now: DateTime<Utc>,
) -> crate::ApiResult<PasteView> {
    let paste = db.retrieve_paste(id, now).await?.ok_or(ApiError::NotFound)?;
    Ok(paste.into())
}

/// Delete pastes that can no longer be retrieved at `now`.
pub async fn purge_expired(db: &Database, now: DateTime<Utc>) -> crate::ApiResult<u64> {
    let count = db.delete_dead_pastes(now).await?;
    if count > 0 {
        info!("deleted {count} pastes");
    }
    Ok(count)
}
