use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::task::JoinHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::clock::RequestTime;
use crate::config::Config;
use crate::controllers::paste;
use crate::db::Database;
use crate::models::PasteView;
use crate::types::api::{CreatePaste, CreatedPaste, Health};
use crate::App;

/// Usage notes served at the root.
const USAGE: &str = include_str!("../../assets/usage.txt");

pub async fn run(app: App) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], app.config.port));

    if let Some(secs) = app.config.maintenance.purge_interval_secs.filter(|&s| s > 0) {
        spawn_purge_task(app.database.clone(), Duration::from_secs(secs));
    }

    info!("listening on {addr}");

    axum::Server::bind(&addr)
        .serve(router(app).into_make_service())
        .await?;

    Ok(())
}

pub fn router(app: App) -> Router {
    let max_upload_size = app.config.limits.max_upload_size;

    Router::new()
        .route("/", get(index))
        .route("/api/healthz", get(healthz))
        .route("/api/pastes", post(create_paste))
        .route("/api/pastes/:id", get(get_paste))
        .route("/p/:id", get(get_paste_raw))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

fn spawn_purge_task(db: Database, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(error) = paste::purge_expired(&db, Utc::now()).await {
                warn!(?error, "periodic purge failed");
            }
        }
    })
}

async fn index() -> &'static str {
    USAGE
}

async fn healthz(State(db): State<Database>) -> (StatusCode, Json<Health>) {
    match db.ping().await {
        Ok(()) => (StatusCode::OK, Json(Health { ok: true })),
        Err(error) => {
            warn!(?error, "health check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Health { ok: false }))
        }
    }
}

async fn create_paste(
    State(config): State<Config>,
    State(db): State<Database>,
    RequestTime(now): RequestTime,
    payload: Result<Json<CreatePaste>, JsonRejection>,
) -> crate::ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let paste = paste::create(&db, request.try_into()?, now).await?;

    let path = format!("/p/{id}", id = paste.id);
    let url = format!(
        "{base_url}{path}",
        base_url = config.base_url.trim_end_matches('/')
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, path)],
        Json(CreatedPaste {
            id: paste.id,
            url,
            created_at: paste.created_at,
        }),
    ))
}

async fn get_paste(
    State(db): State<Database>,
    Path(id): Path<String>,
    RequestTime(now): RequestTime,
) -> crate::ApiResult<Json<PasteView>> {
    Ok(Json(paste::retrieve(&db, &id, now).await?))
}

async fn get_paste_raw(
    State(db): State<Database>,
    Path(id): Path<String>,
    RequestTime(now): RequestTime,
) -> crate::ApiResult<String> {
    Ok(paste::retrieve(&db, &id, now).await?.content)
}
