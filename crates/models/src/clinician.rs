//! `clinician` profile rows created alongside clinician accounts.

use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::account;
use crate::errors::ModelError;

pub const DEFAULT_JOB_TITLE: &str = "Clinician";
pub const DEFAULT_DEPARTMENT: &str = "General Medicine";
pub const DEFAULT_CONTACT_INFO: &str = "Not Provided";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clinician")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub clinician_id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    /// Job title, not the account role.
    pub role: String,
    pub department: String,
    pub contact_info: String,
    pub license_number: String,
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

pub fn license_number_for(user_id: i32) -> String {
    format!("LIC-{user_id}")
}

pub async fn create_default<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    first_name: &str,
    last_name: &str,
) -> Result<Model, ModelError> {
    let am = ActiveModel {
        user_id: Set(user_id),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        full_name: Set(format!("{first_name} {last_name}")),
        role: Set(DEFAULT_JOB_TITLE.to_string()),
        department: Set(DEFAULT_DEPARTMENT.to_string()),
        contact_info: Set(DEFAULT_CONTACT_INFO.to_string()),
        license_number: Set(license_number_for(user_id)),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).one(db).await?)
}
