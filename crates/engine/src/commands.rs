//! Command structs for engine operations.
//!
//! These types group parameters for write operations (top-up, charge,
//! account opening), keeping call sites readable and avoiding long argument
//! lists.

use uuid::Uuid;

use crate::{Money, TransactionKind};

/// Apply a balance change of either direction.
///
/// `reference` is the idempotency key of the operation. When `None` the
/// engine generates a unique `TXN-...` reference.
#[derive(Clone, Debug)]
pub struct ApplyCmd {
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Money,
    pub reference: Option<String>,
}

impl ApplyCmd {
    #[must_use]
    pub fn new(account_id: Uuid, kind: TransactionKind, amount: Money) -> Self {
        Self {
            account_id,
            kind,
            amount,
            reference: None,
        }
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Add funds to an account.
#[derive(Clone, Debug)]
pub struct TopUpCmd {
    pub account_id: Uuid,
    pub amount: Money,
    pub reference: Option<String>,
}

impl TopUpCmd {
    #[must_use]
    pub fn new(account_id: Uuid, amount: Money) -> Self {
        Self {
            account_id,
            amount,
            reference: None,
        }
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Take funds from an account.
#[derive(Clone, Debug)]
pub struct ChargeCmd {
    pub account_id: Uuid,
    pub amount: Money,
    pub reference: Option<String>,
}

impl ChargeCmd {
    #[must_use]
    pub fn new(account_id: Uuid, amount: Money) -> Self {
        Self {
            account_id,
            amount,
            reference: None,
        }
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

impl From<TopUpCmd> for ApplyCmd {
    fn from(cmd: TopUpCmd) -> Self {
        Self {
            account_id: cmd.account_id,
            kind: TransactionKind::TopUp,
            amount: cmd.amount,
            reference: cmd.reference,
        }
    }
}

impl From<ChargeCmd> for ApplyCmd {
    fn from(cmd: ChargeCmd) -> Self {
        Self {
            account_id: cmd.account_id,
            kind: TransactionKind::Charge,
            amount: cmd.amount,
            reference: cmd.reference,
        }
    }
}

/// Open a new user together with its zero-balance account.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}
