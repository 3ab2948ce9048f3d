use anyhow::Context;
use chrono::Utc;
use tracing::info;

use crate::controllers::paste;
use crate::App;

pub async fn run(app: App) -> anyhow::Result<()> {
    let count = paste::purge_expired(&app.database, Utc::now())
        .await
        .context("failed to purge expired pastes")?;

    info!("purge finished, {count} pastes removed");
    Ok(())
}
