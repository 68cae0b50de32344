//! `users` table: credentials and role for every account.

use chrono::Utc;
use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{clinician, patient, refresh_token};

pub const ROLE_PATIENT: &str = "patient";
pub const ROLE_CLINICIAN: &str = "clinician";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Patient,
    Clinician,
    RefreshToken,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Patient => Entity::has_one(patient::Entity).into(),
            Relation::Clinician => Entity::has_one(clinician::Entity).into(),
            Relation::RefreshToken => Entity::has_many(refresh_token::Entity).into(),
        }
    }
}

impl Related<patient::Entity> for Entity {
    fn to() -> RelationDef { Relation::Patient.def() }
}

impl Related<clinician::Entity> for Entity {
    fn to() -> RelationDef { Relation::Clinician.def() }
}

impl Related<refresh_token::Entity> for Entity {
    fn to() -> RelationDef { Relation::RefreshToken.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.trim().is_empty() && !domain.trim().is_empty() => Ok(()),
        _ => Err(ModelError::Validation("invalid email".into())),
    }
}

/// Insert an active, unverified account. A duplicate email surfaces as `ModelError::Duplicate`.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<Model, ModelError> {
    validate_email(email)?;
    if role != ROLE_PATIENT && role != ROLE_CLINICIAN {
        return Err(ModelError::Validation(format!("unknown role: {role}")));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        role: Set(role.to_string()),
        is_active: Set(true),
        email_verified: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

pub async fn email_exists<C: ConnectionTrait>(db: &C, email: &str) -> Result<bool, ModelError> {
    let found: Option<i32> = Entity::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::Email.eq(email))
        .into_tuple()
        .one(db)
        .await?;
    Ok(found.is_some())
}

/// Replace the stored hash and bump `updated_at`. Returns false when no row matched.
pub async fn update_password_hash<C: ConnectionTrait>(db: &C, id: i32, password_hash: &str) -> Result<bool, ModelError> {
    if password_hash.trim().is_empty() {
        return Err(ModelError::Validation("password hash required".into()));
    }
    let res = Entity::update_many()
        .col_expr(Column::PasswordHash, Expr::value(password_hash))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_needs_both_sides_of_at() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("plain").is_err());
    }
}
