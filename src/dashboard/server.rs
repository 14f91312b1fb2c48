use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::routes;
use super::state::DashboardState;
use super::websocket;

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        // HTML
        .route("/", get(routes::index))
        .route("/api/screen", get(routes::get_screen))
        // JSON API
        .route("/api/session", get(routes::get_session))
        .route("/api/start", post(routes::start))
        .route("/api/next", post(routes::next))
        .route("/api/exit", post(routes::exit))
        .route("/api/appearance", post(routes::toggle_appearance))
        // Live updates
        .route("/api/events", get(websocket::ws_handler))
        .with_state(state)
}

/// Start the web interface on `127.0.0.1:port`.
///
/// Runs as a background tokio task alongside the REPL.
pub async fn start_dashboard(state: Arc<DashboardState>, port: u16) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router(state)).await?;
    Ok(())
}
