use anyhow::{Context, Result};
use std::time::Duration;

use tower_http::services::ServeDir;
use tracing::info;

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{log_requests, state::*, upload_routes::make_upload_routes, ServerConfig};
use crate::entry_store::LocalEntryStore;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub entries: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        entries: state.entry_store.records().count().unwrap_or(0),
    };
    Json(stats)
}

pub fn make_app(config: ServerConfig, entry_store: LocalEntryStore) -> Router {
    let state = ServerState::new(config.clone(), entry_store);

    let api_routes = make_upload_routes(state.clone())
        .layer(DefaultBodyLimit::max(config.max_body_size()));

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    #[allow(unused_mut)]
    let mut app: Router = home_router.nest("/api", api_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app.layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(config: ServerConfig, entry_store: LocalEntryStore) -> Result<()> {
    entry_store
        .blobs()
        .init()
        .await
        .context("Failed to prepare media directory")?;
    let port = config.port;
    let app = make_app(config, entry_store);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
