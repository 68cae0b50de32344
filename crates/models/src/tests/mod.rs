//! Postgres-backed model tests. Skipped when `SKIP_DB_TESTS` is set or no
//! `DATABASE_URL` is available.


/// Transaction handling for account + profile creation
pub mod transaction_tests;

use sea_orm::DatabaseConnection;
use migration::MigratorTrait;

pub(crate) fn db_tests_disabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err()
}

pub(crate) async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    let db = crate::db::connect().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub(crate) fn unique_email(prefix: &str) -> String {
    format!("{prefix}_{}@example.com", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}
