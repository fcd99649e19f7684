use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod health;
mod server;
mod transactions;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountCreated, AccountNew, AccountView, UserView};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            BalanceChangeNew, TransactionKind, TransactionListResponse, TransactionReceipt,
            TransactionView,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::DuplicateReference => StatusCode::CONFLICT,
        ErrorKind::Validation | ErrorKind::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err.kind() {
        ErrorKind::Storage => {
            tracing::error!("storage failure: {err}");
            "internal server error".to_string()
        }
        _ => err.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
