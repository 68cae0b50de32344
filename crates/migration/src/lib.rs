//! Migrator registering the credential-store tables in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_patient;
mod m20240101_000003_create_clinician;
mod m20240101_000004_create_refresh_tokens;
mod m20240101_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_patient::Migration),
            Box::new(m20240101_000003_create_clinician::Migration),
            Box::new(m20240101_000004_create_refresh_tokens::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000005_add_indexes::Migration),
        ]
    }
}
