//! Transactions API endpoints

use api_types::transaction::{
    BalanceChangeNew, TransactionKind as ApiKind, TransactionListResponse, TransactionReceipt,
    TransactionView,
};
use axum::{
    Json,
    extract::{Path, State},
};
use engine::{AppliedTransaction, ChargeCmd, Money, TopUpCmd};

use crate::{ServerError, accounts::parse_id, server::ServerState};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::TopUp => ApiKind::TopUp,
        engine::TransactionKind::Charge => ApiKind::Charge,
    }
}

fn receipt(applied: AppliedTransaction) -> TransactionReceipt {
    let tx = applied.transaction;
    TransactionReceipt {
        transaction_id: tx.id,
        account_id: tx.account_id,
        kind: map_kind(tx.kind),
        amount: tx.amount.to_major(),
        reference: tx.reference,
        new_balance: applied.balance.to_major(),
    }
}

fn view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        kind: map_kind(tx.kind),
        amount: tx.amount.to_major(),
        reference: tx.reference,
        created_at: tx.created_at,
    }
}

pub async fn top_up(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<BalanceChangeNew>,
) -> Result<Json<TransactionReceipt>, ServerError> {
    let mut cmd = TopUpCmd::new(parse_id(&id)?, Money::from_major(payload.amount)?);
    if let Some(reference) = payload.reference {
        cmd = cmd.reference(reference);
    }

    let applied = state.engine.top_up(cmd).await?;
    Ok(Json(receipt(applied)))
}

pub async fn charge(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<BalanceChangeNew>,
) -> Result<Json<TransactionReceipt>, ServerError> {
    let mut cmd = ChargeCmd::new(parse_id(&id)?, Money::from_major(payload.amount)?);
    if let Some(reference) = payload.reference {
        cmd = cmd.reference(reference);
    }

    let applied = state.engine.charge(cmd).await?;
    Ok(Json(receipt(applied)))
}

pub async fn list(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let txs = state
        .engine
        .transactions_for_account(parse_id(&id)?)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(view).collect(),
    }))
}

pub async fn get_by_reference(
    State(state): State<ServerState>,
    Path(reference): Path<String>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction_by_reference(&reference).await?;
    Ok(Json(view(tx)))
}
