//! Transaction primitives and the transaction log.
//!
//! A `Transaction` is the immutable record of one balance change on one
//! account. The amount is always positive; the direction comes from the
//! [`TransactionKind`]. Rows are append-only: nothing in the engine updates
//! them after the insert.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, SqlErr, entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    TopUp,
    Charge,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopUp => "top-up",
            Self::Charge => "charge",
        }
    }

    /// Signed effect of `amount` on the balance.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Self::TopUp => amount,
            Self::Charge => -amount,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "top-up" => Ok(Self::TopUp),
            "charge" => Ok(Self::Charge),
            other => Err(EngineError::CorruptData(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: Money,
    pub reference: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        account_id: Uuid,
        kind: TransactionKind,
        amount: Money,
        reference: String,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        if reference.is_empty() {
            return Err(EngineError::InvalidReference(
                "reference must not be empty".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            // v7 ids sort by creation time, which keeps history reads stable
            // when two rows share a timestamp.
            id: Uuid::now_v7(),
            kind,
            amount,
            reference,
            account_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Signed effect of this transaction on the account balance.
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub amount_minor: i64,
    #[sea_orm(unique)]
    pub reference: String,
    pub account_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            reference: ActiveValue::Set(tx.reference.clone()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
            deleted_at: ActiveValue::Set(None),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            reference: model.reference,
            account_id: parse_uuid(&model.account_id, "account")?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Append-only storage for transactions.
pub(crate) struct TransactionLog;

impl TransactionLog {
    /// Insert a new row.
    ///
    /// The unique index on `reference` is the authoritative duplicate check:
    /// a violation is reported as `DuplicateReference` no matter what any
    /// earlier lookup said.
    pub(crate) async fn insert<C: ConnectionTrait>(conn: &C, tx: &Transaction) -> ResultEngine<()> {
        match ActiveModel::from(tx).insert(conn).await {
            Ok(_) => Ok(()),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(EngineError::DuplicateReference(tx.reference.clone()))
                }
                _ => Err(err.into()),
            },
        }
    }

    pub(crate) async fn find_by_reference<C: ConnectionTrait>(
        conn: &C,
        reference: &str,
    ) -> ResultEngine<Option<Transaction>> {
        Entity::find()
            .filter(Column::Reference.eq(reference.to_string()))
            .filter(Column::DeletedAt.is_null())
            .one(conn)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    /// `true` if any row (deleted or not) already uses `reference`.
    pub(crate) async fn reference_exists<C: ConnectionTrait>(
        conn: &C,
        reference: &str,
    ) -> ResultEngine<bool> {
        let found = Entity::find()
            .filter(Column::Reference.eq(reference.to_string()))
            .one(conn)
            .await?;
        Ok(found.is_some())
    }

    /// Non-deleted transactions of an account, oldest first.
    pub(crate) async fn find_by_account<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        Entity::find()
            .filter(Column::AccountId.eq(account_id.to_string()))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}
