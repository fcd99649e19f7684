//! The module contains the error the engine can throw.
//!
//! Every failure maps to exactly one [`ErrorKind`], so a boundary layer can
//! turn it into a distinct response without matching on messages:
//!
//! - [`InvalidAmount`], [`InvalidReference`] and [`InvalidInput`] are caller
//!   errors, rejected before the database is touched.
//! - [`KeyNotFound`] when an account, user or transaction does not exist (or
//!   was soft-deleted).
//! - [`ExistingKey`] when a unique user/account constraint would be violated.
//! - [`InsufficientFunds`] when a charge exceeds the freshly read balance.
//! - [`DuplicateReference`] when a transaction reference was already used.
//! - [`Database`] and [`CorruptData`] for storage faults. The unit of work
//!   has been rolled back when they are returned.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidReference`]: EngineError::InvalidReference
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`DuplicateReference`]: EngineError::DuplicateReference
//!  [`Database`]: EngineError::Database
//!  [`CorruptData`]: EngineError::CorruptData
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Duplicate reference: \"{0}\"")]
    DuplicateReference(String),
    #[error("Corrupt data: {0}")]
    CorruptData(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse classification of [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    InsufficientFunds,
    DuplicateReference,
    Storage,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_) | Self::InvalidReference(_) | Self::InvalidInput(_) => {
                ErrorKind::Validation
            }
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::ExistingKey(_) => ErrorKind::Conflict,
            Self::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            Self::DuplicateReference(_) => ErrorKind::DuplicateReference,
            Self::CorruptData(_) | Self::Database(_) => ErrorKind::Storage,
        }
    }

    /// Returns `true` for conditions the caller is expected to handle
    /// (everything except storage faults).
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }
}
