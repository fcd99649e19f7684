//! Read-only views on the transaction log.
//!
//! Transaction rows never change once inserted, so plain lookups run outside
//! any unit of work. Balance verification reads the account and its log in
//! one transaction so both come from the same snapshot.

use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, Transaction, accounts::AccountStore,
    transactions::TransactionLog,
};

use super::{Engine, with_tx};

/// Stored balance of an account next to the balance replayed from its log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub account_id: Uuid,
    pub stored: Money,
    pub computed: Money,
    pub transactions: usize,
}

impl BalanceCheck {
    /// `true` when the stored balance equals the signed sum of the log.
    pub fn is_consistent(&self) -> bool {
        self.stored == self.computed
    }
}

impl Engine {
    /// Return a transaction by its reference.
    pub async fn transaction_by_reference(&self, reference: &str) -> ResultEngine<Transaction> {
        TransactionLog::find_by_reference(&self.database, reference.trim())
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("transaction {reference}")))
    }

    /// Return the transactions of an account, oldest first.
    pub async fn transactions_for_account(&self, account_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        AccountStore::get_by_id(&self.database, account_id).await?;
        TransactionLog::find_by_account(&self.database, account_id).await
    }

    /// Replay the log of an account and compare it with the stored balance.
    pub async fn verify_balance(&self, account_id: Uuid) -> ResultEngine<BalanceCheck> {
        let check = with_tx!(self, |db_tx| { Self::replay_in_tx(&db_tx, account_id).await })?;
        if !check.is_consistent() {
            tracing::warn!(
                %account_id,
                stored = %check.stored,
                computed = %check.computed,
                "balance does not match transaction log"
            );
        }
        Ok(check)
    }

    async fn replay_in_tx(
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<BalanceCheck> {
        let account = AccountStore::get_by_id(db_tx, account_id).await?;
        let transactions = TransactionLog::find_by_account(db_tx, account_id).await?;

        let mut computed = Money::ZERO;
        for tx in &transactions {
            computed = computed
                .checked_add(tx.signed_amount())
                .ok_or_else(|| EngineError::CorruptData("balance overflow".to_string()))?;
        }

        Ok(BalanceCheck {
            account_id,
            stored: account.balance,
            computed,
            transactions: transactions.len(),
        })
    }
}
