use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{accounts, health, transactions};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Build the `/api/v1` router around a shared engine.
pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route("/health", get(health::get))
        .route("/accounts", post(accounts::account_new))
        .route("/accounts/{id}", get(accounts::get))
        .route("/accounts/{id}/top-up", post(transactions::top_up))
        .route("/accounts/{id}/charge", post(transactions::charge))
        .route("/accounts/{id}/transactions", get(transactions::list))
        .route("/transactions/{reference}", get(transactions::get_by_reference));

    Router::new().nest("/api/v1", api).with_state(state)
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
