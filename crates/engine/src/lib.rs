//! Wallet ledger engine.
//!
//! Accounts hold a balance that only changes through top-ups and charges.
//! Every change is recorded as an immutable transaction carrying a unique
//! reference, and the balance write and the transaction insert commit
//! together or not at all.

pub use accounts::Account;
pub use commands::{ApplyCmd, ChargeCmd, NewAccountCmd, TopUpCmd};
pub use error::{EngineError, ErrorKind};
pub use money::Money;
pub use ops::{AppliedTransaction, BalanceCheck, Engine, EngineBuilder, OpenedAccount};
pub use transactions::{Transaction, TransactionKind};
pub use users::User;

mod accounts;
mod commands;
mod error;
mod money;
mod ops;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
