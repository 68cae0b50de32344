use anyhow::Result;
use sea_orm::{EntityTrait, TransactionTrait};

use super::{db_tests_disabled, setup_test_db, unique_email};
use crate::{account, clinician};

/// Commit makes both the account and its profile visible.
#[tokio::test]
async fn test_account_and_profile_commit_together() -> Result<()> {
    if db_tests_disabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;

    let txn = db.begin().await?;
    let acc = account::create(&txn, &unique_email("tx_commit"), "$argon2id$placeholder", account::ROLE_CLINICIAN).await?;
    clinician::create_default(&txn, acc.id, "Gregory", "House").await?;
    txn.commit().await?;

    assert!(account::find_by_id(&db, acc.id).await?.is_some());
    let prof = clinician::find_by_user(&db, acc.id).await?.expect("clinician row");
    assert_eq!(prof.license_number, format!("LIC-{}", acc.id));
    assert_eq!(prof.department, clinician::DEFAULT_DEPARTMENT);

    account::Entity::delete_by_id(acc.id).exec(&db).await?;
    Ok(())
}

/// Dropping the transaction without commit leaves no trace of either row.
#[tokio::test]
async fn test_dropped_transaction_rolls_back_both_rows() -> Result<()> {
    if db_tests_disabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;

    let email = unique_email("tx_drop");
    let acc_id = {
        let txn = db.begin().await?;
        let acc = account::create(&txn, &email, "$argon2id$placeholder", account::ROLE_CLINICIAN).await?;
        clinician::create_default(&txn, acc.id, "Temp", "Doc").await?;
        acc.id
    };

    assert!(account::find_by_id(&db, acc_id).await?.is_none());
    assert!(clinician::find_by_user(&db, acc_id).await?.is_none());
    assert!(!account::email_exists(&db, &email).await?);
    Ok(())
}
