//! Accounts API endpoints

use api_types::account::{AccountCreated, AccountNew, AccountView, UserView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::NewAccountCmd;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::Generic(format!("invalid account id: {raw}")))
}

pub(crate) fn account_view(account: &engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        user_id: account.user_id,
        balance: account.balance.to_major(),
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

/// Handle requests for opening a user with its account
pub async fn account_new(
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountCreated>), ServerError> {
    let opened = state
        .engine
        .create_account_with_user(NewAccountCmd::new(
            payload.email,
            payload.first_name,
            payload.last_name,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            user: UserView {
                id: opened.user.id,
                email: opened.user.email,
                first_name: opened.user.first_name,
                last_name: opened.user.last_name,
            },
            account: account_view(&opened.account),
        }),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(parse_id(&id)?).await?;
    Ok(Json(account_view(&account)))
}
