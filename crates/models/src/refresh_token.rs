//! `refresh_tokens` table. A row moves from active to revoked and nowhere else.

use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::account;
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    #[sea_orm(unique, column_type = "Text")]
    pub token: String,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub revoked: bool,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Account,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Account => Entity::belongs_to(account::Entity)
                .from(Column::UserId)
                .to(account::Column::Id)
                .into(),
        }
    }
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef { Relation::Account.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<Model, ModelError> {
    if token.is_empty() {
        return Err(ModelError::Validation("token required".into()));
    }
    let am = ActiveModel {
        user_id: Set(user_id),
        token: Set(token.to_string()),
        expires_at: Set(expires_at.into()),
        created_at: Set(Utc::now().into()),
        revoked: Set(false),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

/// Token row that is neither revoked nor past `now`.
pub async fn find_active<C: ConnectionTrait>(db: &C, token: &str, now: DateTime<Utc>) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Token.eq(token))
        .filter(Column::Revoked.eq(false))
        .filter(Column::ExpiresAt.gt(now))
        .one(db)
        .await?)
}

/// Unconditional revoke; returns rows matched (0 when the token is unknown).
pub async fn revoke<C: ConnectionTrait>(db: &C, token: &str) -> Result<u64, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Revoked, Expr::value(true))
        .filter(Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

/// Revoke only if still active. Under concurrent callers exactly one sees 1.
pub async fn revoke_if_active<C: ConnectionTrait>(db: &C, token: &str, now: DateTime<Utc>) -> Result<u64, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Revoked, Expr::value(true))
        .filter(Column::Token.eq(token))
        .filter(Column::Revoked.eq(false))
        .filter(Column::ExpiresAt.gt(now))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn revoke_all_for_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<u64, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Revoked, Expr::value(true))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Revoked.eq(false))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
