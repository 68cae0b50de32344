//! `patient` profile rows created alongside patient accounts.

use chrono::NaiveDate;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::account;
use crate::errors::ModelError;

pub const DEFAULT_GENDER: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "patient")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub patient_id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_of_birth: Date,
    pub gender: String,
    pub medical_record_number: String,
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

/// Placeholder date of birth until the patient record is completed.
pub fn default_date_of_birth() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

pub fn medical_record_number_for(user_id: i32) -> String {
    format!("MRN-{user_id}")
}

/// Insert the registration-time patient profile with placeholder demographics.
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
        date_of_birth: Set(default_date_of_birth()),
        gender: Set(DEFAULT_GENDER.to_string()),
        medical_record_number: Set(medical_record_number_for(user_id)),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).one(db).await?)
}
