//! Create `patient` profile table, one row per patient account.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Patient::Table)
                    .if_not_exists()
                    .col(pk_auto(Patient::PatientId))
                    .col(integer(Patient::UserId).unique_key().not_null())
                    .col(string_len(Patient::FirstName, 100).not_null())
                    .col(string_len(Patient::LastName, 100).not_null())
                    .col(string_len(Patient::FullName, 201).not_null())
                    .col(date(Patient::DateOfBirth).not_null())
                    .col(string_len(Patient::Gender, 32).not_null())
                    .col(string_len(Patient::MedicalRecordNumber, 50).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patient_user")
                            .from(Patient::Table, Patient::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Patient::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Patient {
    Table,
    PatientId,
    UserId,
    FirstName,
    LastName,
    FullName,
    DateOfBirth,
    Gender,
    MedicalRecordNumber,
}

#[derive(DeriveIden)]
enum Users { Table, Id }
