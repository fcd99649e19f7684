//! JSON bodies exchanged with the wallet HTTP API.
//!
//! Amounts travel as JSON numbers in major units (`12.5` is 12.50). The
//! server rounds them to cents once, on the way in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    /// Request body for opening a user together with its account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub email: String,
        pub first_name: String,
        pub last_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub balance: f64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub email: String,
        pub first_name: String,
        pub last_name: String,
    }

    /// Response body of a successful account opening.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountCreated {
        pub user: UserView,
        pub account: AccountView,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum TransactionKind {
        TopUp,
        Charge,
    }

    /// Request body shared by top-up and charge.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceChangeNew {
        /// Must be > 0 after rounding to cents.
        pub amount: f64,
        /// Unique reference of the operation. Generated by the server when
        /// absent; a reused reference is rejected with 409.
        pub reference: Option<String>,
    }

    /// Response body of a committed top-up or charge.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionReceipt {
        pub transaction_id: Uuid,
        pub account_id: Uuid,
        pub kind: TransactionKind,
        pub amount: f64,
        pub reference: String,
        pub new_balance: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub kind: TransactionKind,
        /// Always positive; the kind gives the direction.
        pub amount: f64,
        pub reference: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        /// Oldest first.
        pub transactions: Vec<TransactionView>,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
    }
}
