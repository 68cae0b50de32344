//! Create `clinician` profile table, one row per clinician account.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clinician::Table)
                    .if_not_exists()
                    .col(pk_auto(Clinician::ClinicianId))
                    .col(integer(Clinician::UserId).unique_key().not_null())
                    .col(string_len(Clinician::FirstName, 100).not_null())
                    .col(string_len(Clinician::LastName, 100).not_null())
                    .col(string_len(Clinician::FullName, 201).not_null())
                    .col(string_len(Clinician::Role, 64).not_null())
                    .col(string_len(Clinician::Department, 64).not_null())
                    .col(string_len(Clinician::ContactInfo, 500).not_null())
                    .col(string_len(Clinician::LicenseNumber, 50).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clinician_user")
                            .from(Clinician::Table, Clinician::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Clinician::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Clinician {
    Table,
    ClinicianId,
    UserId,
    FirstName,
    LastName,
    FullName,
    Role,
    Department,
    ContactInfo,
    LicenseNumber,
}

#[derive(DeriveIden)]
enum Users { Table, Id }
