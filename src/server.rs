use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tracing::info;

use crate::dispatcher::Dispatcher;

/// Router with a single POST route at `path` feeding the dispatcher.
pub fn router(dispatcher: Arc<Dispatcher>, path: &str) -> Router {
    Router::new()
        .route(path, post(slash_command))
        .with_state(dispatcher)
}

async fn slash_command(
    State(dispatcher): State<Arc<Dispatcher>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    match dispatcher
        .handle_request_with_query(query.as_deref(), &body)
        .await
    {
        Ok(delivery) => delivery.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Serve slash commands on `bind` until Ctrl-C.
pub async fn run(bind: &str, path: &str, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;

    info!("Listening for slash commands on http://{}{}", bind, path);

    axum::serve(listener, router(dispatcher, path))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
