use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::ApiError;

/// A paste row as stored, with timestamps in Unix epoch milliseconds.
#[derive(Debug, FromRow)]
pub struct PasteRow {
    pub id: String,
    pub content: String,
    pub created_at: i64,
    pub expires_at: Option<i64>,
    pub max_views: Option<i64>,
    pub view_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteState {
    Active,
    Exhausted,
    TimedOut,
}

impl fmt::Display for PasteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PasteState::Active => "active",
            PasteState::Exhausted => "exhausted",
            PasteState::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paste {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i64>,
    pub view_count: i64,
}

impl Paste {
    /// Whether the paste has timed out at `now`. Expiry is inclusive.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| now >= expires_at)
    }

    /// Whether the paste has used up its view limit.
    pub fn is_exhausted(&self) -> bool {
        self.max_views
            .map_or(false, |max_views| self.view_count >= max_views)
    }

    /// Where the paste is in its lifecycle at `now`. Both dead states are
    /// terminal. Timing out takes precedence when both apply.
    pub fn state_at(&self, now: DateTime<Utc>) -> PasteState {
        if self.is_expired_at(now) {
            PasteState::TimedOut
        } else if self.is_exhausted() {
            PasteState::Exhausted
        } else {
            PasteState::Active
        }
    }

    pub fn remaining_views(&self) -> Option<i64> {
        self.max_views
            .map(|max_views| (max_views - self.view_count).max(0))
    }
}

impl TryFrom<PasteRow> for Paste {
    type Error = ApiError;

    fn try_from(row: PasteRow) -> Result<Self, Self::Error> {
        let created_at = from_millis(row.created_at)?;
        let expires_at = row.expires_at.map(from_millis).transpose()?;
        Ok(Paste {
            id: row.id,
            content: row.content,
            created_at,
            expires_at,
            max_views: row.max_views,
            view_count: row.view_count,
        })
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, ApiError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ApiError::CorruptRecord(format!("timestamp out of range: {millis}")))
}

/// What a successful retrieval hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteView {
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub remaining_views: Option<i64>,
}

impl From<Paste> for PasteView {
    fn from(paste: Paste) -> Self {
        let remaining_views = paste.remaining_views();
        PasteView {
            content: paste.content,
            created_at: paste.created_at,
            expires_at: paste.expires_at,
            remaining_views,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn paste(expires_at: Option<DateTime<Utc>>, max_views: Option<i64>, view_count: i64) -> Paste {
        Paste {
            id: "abcdefghij".into(),
            content: "hello".into(),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            expires_at,
            max_views,
            view_count,
        }
    }

    #[test]
    fn expiry_is_inclusive_of_boundary() {
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let p = paste(Some(t0 + Duration::seconds(10)), None, 0);
        assert!(!p.is_expired_at(t0 + Duration::milliseconds(9_999)));
        assert!(p.is_expired_at(t0 + Duration::milliseconds(10_000)));
        assert!(p.is_expired_at(t0 + Duration::days(1)));
    }

    #[test]
    fn exhaustion_and_remaining_views() {
        assert!(!paste(None, Some(2), 1).is_exhausted());
        assert!(paste(None, Some(2), 2).is_exhausted());
        assert!(paste(None, Some(0), 0).is_exhausted());
        assert_eq!(paste(None, Some(3), 1).remaining_views(), Some(2));
        assert_eq!(paste(None, None, 50).remaining_views(), None);
    }

    #[test]
    fn unbounded_paste_is_always_active() {
        let p = paste(None, None, 1_000_000);
        assert_eq!(
            p.state_at(Utc::now() + Duration::days(365 * 100)),
            PasteState::Active
        );
    }

    #[test]
    fn timing_out_wins_over_exhaustion() {
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let p = paste(Some(t0), Some(1), 1);
        assert_eq!(p.state_at(t0 - Duration::seconds(1)), PasteState::Exhausted);
        assert_eq!(p.state_at(t0), PasteState::TimedOut);
    }

    #[test]
    fn row_conversion_rejects_out_of_range_timestamps() {
        let row = PasteRow {
            id: "abcdefghij".into(),
            content: "x".into(),
            created_at: i64::MAX,
            expires_at: None,
            max_views: None,
            view_count: 0,
        };
        assert!(matches!(
            Paste::try_from(row),
            Err(ApiError::CorruptRecord(_))
        ));
    }
}
