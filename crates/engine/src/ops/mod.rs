use sea_orm::DatabaseConnection;

mod accounts;
mod history;
mod ledger;

pub use accounts::OpenedAccount;
pub use history::BalanceCheck;
pub use ledger::AppliedTransaction;

/// Run a block inside a DB transaction (the unit of work), committing on
/// success and rolling back on error.
///
/// The body must evaluate to a `ResultEngine<T>`. Keep `?` out of the body
/// itself (call a helper instead) so the error path always reaches the
/// explicit rollback; a panic or an early return still rolls back when the
/// transaction is dropped.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("rolling back: {err}");
                if let Err(rollback_err) = $tx.rollback().await {
                    tracing::error!("rollback failed after \"{err}\": {rollback_err}");
                    return Err(rollback_err.into());
                }
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> crate::ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
