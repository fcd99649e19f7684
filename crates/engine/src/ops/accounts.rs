use sea_orm::{DatabaseTransaction, QueryFilter, SqlErr, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Account, EngineError, NewAccountCmd, ResultEngine, User,
    accounts::AccountStore,
    users,
    util::{normalize_email, normalize_required_name},
};

use super::{Engine, with_tx};

/// A freshly created user and its account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedAccount {
    pub user: User,
    pub account: Account,
}

impl Engine {
    /// Create a user and its zero-balance account in one unit of work.
    ///
    /// Fails with `ExistingKey` if the email is already registered.
    pub async fn create_account_with_user(&self, cmd: NewAccountCmd) -> ResultEngine<OpenedAccount> {
        let email = normalize_email(&cmd.email)?;
        let first_name = normalize_required_name(&cmd.first_name, "first name")?;
        let last_name = normalize_required_name(&cmd.last_name, "last name")?;

        let opened = with_tx!(self, |db_tx| {
            self.open_account_in_tx(&db_tx, User::new(email, first_name, last_name))
                .await
        })?;
        tracing::info!(
            account_id = %opened.account.id,
            user_id = %opened.user.id,
            "account opened"
        );
        Ok(opened)
    }

    async fn open_account_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user: User,
    ) -> ResultEngine<OpenedAccount> {
        let exists = users::Entity::find()
            .filter(users::Column::Email.eq(user.email.clone()))
            .one(db_tx)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingKey(user.email));
        }

        if let Err(err) = users::ActiveModel::from(&user).insert(db_tx).await {
            return match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(EngineError::ExistingKey(user.email))
                }
                _ => Err(err.into()),
            };
        }
        let account = AccountStore::create(db_tx, user.id).await?;
        Ok(OpenedAccount { user, account })
    }

    /// Create the account of an existing user.
    ///
    /// Fails with `ExistingKey` if the user already owns an account.
    pub async fn create_account(&self, user_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            match self.require_user(&db_tx, user_id).await {
                Ok(_) => AccountStore::create(&db_tx, user_id).await,
                Err(err) => Err(err),
            }
        })
    }

    /// Return a non-deleted account.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        AccountStore::get_by_id(&self.database, account_id).await
    }

    /// Soft-delete an account. Later ledger operations on it fail with
    /// `KeyNotFound`; its transactions are kept.
    pub async fn delete_account(&self, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            AccountStore::soft_delete(&db_tx, account_id).await
        })?;
        tracing::info!(%account_id, "account deleted");
        Ok(())
    }

    /// Return a non-deleted user.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        self.require_user(&self.database, user_id).await
    }

    /// Look a user up by email (case-insensitive).
    pub async fn user_by_email(&self, email: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.clone()))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(email))?;
        User::try_from(model)
    }

    async fn require_user<C: ConnectionTrait>(&self, conn: &C, user_id: Uuid) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id.to_string())
            .filter(users::Column::DeletedAt.is_null())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;
        User::try_from(model)
    }
}
