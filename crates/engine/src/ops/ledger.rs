//! Balance mutations.
//!
//! Every top-up and charge goes through [`Engine::apply`], which runs the
//! whole read-check-write sequence in one unit of work:
//!
//! 1. lock the account row (unknown or deleted account -> `KeyNotFound`)
//! 2. reject a reference that is already in the log (`DuplicateReference`)
//! 3. for charges, check the freshly read balance (`InsufficientFunds`)
//! 4. insert the transaction row, then write the new balance
//!
//! Either both writes commit or neither does.

use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    ApplyCmd, ChargeCmd, EngineError, Money, ResultEngine, TopUpCmd, Transaction, TransactionKind,
    accounts::AccountStore,
    transactions::TransactionLog,
    util::{resolve_reference, validate_amount},
};

use super::{Engine, with_tx};

/// Result of a committed balance change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTransaction {
    pub transaction: Transaction,
    /// Account balance right after this transaction.
    pub balance: Money,
}

/// Generates a directional ledger method (top-up, charge).
macro_rules! impl_ledger_op {
    ($(#[$meta:meta])* $fn_name:ident, $cmd_type:ty) => {
        $(#[$meta])*
        pub async fn $fn_name(&self, cmd: $cmd_type) -> ResultEngine<AppliedTransaction> {
            self.apply(ApplyCmd::from(cmd)).await
        }
    };
}

impl Engine {
    impl_ledger_op!(
        /// Add funds to an account.
        top_up,
        TopUpCmd
    );

    impl_ledger_op!(
        /// Take funds from an account. Fails with `InsufficientFunds` when the
        /// balance is lower than the amount.
        charge,
        ChargeCmd
    );

    /// Apply a balance change atomically.
    ///
    /// Amount and reference are validated before the database is touched.
    /// Nothing is retried: a duplicate reference or an insufficient balance
    /// is returned to the caller as-is.
    #[instrument(
        skip(self, cmd),
        fields(account_id = %cmd.account_id, kind = cmd.kind.as_str(), amount = %cmd.amount)
    )]
    pub async fn apply(&self, cmd: ApplyCmd) -> ResultEngine<AppliedTransaction> {
        let amount = validate_amount(cmd.amount)?;
        let reference = resolve_reference(cmd.reference.as_deref())?;

        let applied = with_tx!(self, |db_tx| {
            self.apply_in_tx(&db_tx, cmd.account_id, cmd.kind, amount, reference)
                .await
        })?;

        tracing::info!(
            transaction_id = %applied.transaction.id,
            reference = %applied.transaction.reference,
            balance = %applied.balance,
            "transaction committed"
        );
        Ok(applied)
    }

    async fn apply_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        kind: TransactionKind,
        amount: Money,
        reference: String,
    ) -> ResultEngine<AppliedTransaction> {
        AccountStore::lock_for_update(db_tx, account_id).await?;
        let account = AccountStore::get_by_id(db_tx, account_id).await?;

        // Cheap early exit; the unique index still decides on insert.
        if TransactionLog::reference_exists(db_tx, &reference).await? {
            return Err(EngineError::DuplicateReference(reference));
        }

        if kind == TransactionKind::Charge && account.balance < amount {
            return Err(EngineError::InsufficientFunds(format!(
                "balance {} is lower than {}",
                account.balance, amount
            )));
        }

        let new_balance = account
            .balance
            .checked_add(kind.signed(amount))
            .filter(|balance| balance.is_storable())
            .ok_or_else(|| {
                EngineError::InvalidAmount(format!(
                    "resulting balance would exceed {}",
                    Money::MAX
                ))
            })?;

        let transaction = Transaction::new(account.id, kind, amount, reference)?;
        TransactionLog::insert(db_tx, &transaction).await?;
        let account = AccountStore::update_balance(db_tx, account.id, new_balance).await?;

        Ok(AppliedTransaction {
            transaction,
            balance: account.balance,
        })
    }
}
