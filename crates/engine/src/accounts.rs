//! The module contains `Account` and the account store.
//!
//! An account holds the balance of one user. The balance is denormalized: it
//! always equals the signed sum of the account's transactions, and only the
//! ledger operations in [`crate::Engine`] are allowed to change it.
//!
//! Every store function takes the connection explicitly, so writes always run
//! inside the caller's unit of work instead of committing on their own.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, SqlErr, entity::prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

/// A wallet account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub(crate) fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub user_id: String,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            balance_minor: ActiveValue::Set(value.balance.cents()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
            deleted_at: ActiveValue::Set(None),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            balance: Money::new(model.balance_minor),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

fn not_found(id: Uuid) -> EngineError {
    EngineError::KeyNotFound(format!("account {id}"))
}

/// Durable keyed storage for accounts.
pub(crate) struct AccountStore;

impl AccountStore {
    /// Insert a zero-balance account for `user_id`.
    ///
    /// Fails with `ExistingKey` when the user already owns an account.
    pub(crate) async fn create<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> ResultEngine<Account> {
        let account = Account::new(user_id);
        match ActiveModel::from(&account).insert(conn).await {
            Ok(_) => Ok(account),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(EngineError::ExistingKey(
                    format!("account for user {user_id}"),
                )),
                _ => Err(err.into()),
            },
        }
    }

    /// Return a non-deleted account.
    pub(crate) async fn get_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> ResultEngine<Account> {
        let model = Entity::find_by_id(id.to_string())
            .filter(Column::DeletedAt.is_null())
            .one(conn)
            .await?
            .ok_or_else(|| not_found(id))?;
        Account::try_from(model)
    }

    /// Take the write lock on the account row for the rest of `conn`'s
    /// transaction.
    ///
    /// The lock is acquired by writing the row before anything else is read,
    /// which serializes concurrent ledger operations on the same account on
    /// every backend (on SQLite it also grabs the database write lock before
    /// the transaction holds a read snapshot).
    pub(crate) async fn lock_for_update<C: ConnectionTrait>(conn: &C, id: Uuid) -> ResultEngine<()> {
        let result = Entity::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id.to_string()))
            .filter(Column::DeletedAt.is_null())
            .exec(conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Write the new balance. Must run in the same transaction as the
    /// matching transaction-log insert.
    pub(crate) async fn update_balance<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        new_balance: Money,
    ) -> ResultEngine<Account> {
        let model = ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            balance_minor: ActiveValue::Set(new_balance.cents()),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let model = model.update(conn).await?;
        Account::try_from(model)
    }

    /// Mark the account as deleted. The row and its history stay in place.
    pub(crate) async fn soft_delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> ResultEngine<()> {
        let now = Utc::now();
        let result = Entity::update_many()
            .col_expr(Column::DeletedAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id.to_string()))
            .filter(Column::DeletedAt.is_null())
            .exec(conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
