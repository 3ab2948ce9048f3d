use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};

use crate::models::Paste;
use crate::App;

pub async fn run(app: App, id: &str) -> anyhow::Result<()> {
    let paste = app
        .database
        .get_paste(id)
        .await
        .context("failed to look up paste")?
        .ok_or_else(|| anyhow!("no paste with id '{id}'"))?;

    print!("{}", describe(&paste, Utc::now()));
    Ok(())
}

/// Render a paste's accounting fields and its state at `now`.
fn describe(paste: &Paste, now: DateTime<Utc>) -> String {
    let expires = match paste.expires_at {
        Some(expires_at) => expires_at.to_rfc3339(),
        None => "never".to_owned(),
    };
    let views = match paste.max_views {
        Some(max_views) => format!("{} of {max_views}", paste.view_count),
        None => format!("{} (unlimited)", paste.view_count),
    };

    format!(
        "id:         {id}\n\
         state:      {state}\n\
         created:    {created}\n\
         expires:    {expires}\n\
         views:      {views}\n\
         size:       {size} bytes\n",
        id = paste.id,
        state = paste.state_at(now),
        created = paste.created_at.to_rfc3339(),
        size = paste.content.len(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::controllers::paste::{self, CreateParams};
    use crate::db::test_support::temp_database;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[tokio::test]
    async fn describe_tracks_views_without_counting_one() {
        let (db, _dir) = temp_database().await;
        let created = paste::create(
            &db,
            CreateParams {
                content: "hello".into(),
                ttl_seconds: Some(60),
                max_views: Some(1),
            },
            t0(),
        )
        .await
        .unwrap();

        let stored = db.get_paste(&created.id).await.unwrap().unwrap();
        let text = describe(&stored, t0());
        assert!(text.contains(&format!("id:         {}", created.id)));
        assert!(text.contains("state:      active"));
        assert!(text.contains("views:      0 of 1"));
        assert!(text.contains("size:       5 bytes"));

        paste::retrieve(&db, &created.id, t0()).await.unwrap();
        let stored = db.get_paste(&created.id).await.unwrap().unwrap();
        assert!(describe(&stored, t0()).contains("state:      exhausted"));
        assert!(describe(&stored, t0() + Duration::seconds(60)).contains("state:      timed out"));
        assert_eq!(stored.view_count, 1);
    }

    #[test]
    fn describe_unbounded_paste() {
        let paste = Paste {
            id: "abcdefghij".into(),
            content: "x".into(),
            created_at: t0(),
            expires_at: None,
            max_views: None,
            view_count: 7,
        };
        let text = describe(&paste, t0());
        assert!(text.contains("expires:    never"));
        assert!(text.contains("views:      7 (unlimited)"));
    }
}
