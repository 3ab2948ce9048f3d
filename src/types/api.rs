use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a paste creation request.
///
/// Fields are kept loosely typed so that bad values are reported as invalid
/// input by the validation step rather than as a body parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePaste {
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub ttl_seconds: Option<Value>,
    #[serde(default)]
    pub max_views: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreatedPaste {
    pub id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub ok: bool,
}
