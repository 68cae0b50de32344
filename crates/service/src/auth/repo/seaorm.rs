use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::debug;

use models::errors::ModelError;
use models::{account, clinician, patient, refresh_token};

use crate::auth::domain::{
    Account, ClinicianProfile, PatientProfile, Role, RoleProfile, StoredRefreshToken, UserProfile,
};
use crate::auth::errors::AuthError;
use crate::auth::password;
use crate::auth::repository::{AuthRepository, NewAccount};

/// Postgres-backed repository. Multi-table writes run in a transaction that
/// rolls back when dropped uncommitted.
#[derive(Clone)]
pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_account(m: account::Model) -> Result<Account, AuthError> {
    let role = m
        .role
        .parse::<Role>()
        .map_err(|_| AuthError::Repository(format!("account {} has unknown role {}", m.id, m.role)))?;
    Ok(Account {
        id: m.id,
        email: m.email,
        password_hash: m.password_hash,
        role,
        is_active: m.is_active,
        email_verified: m.email_verified,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

fn to_token(m: refresh_token::Model) -> StoredRefreshToken {
    StoredRefreshToken {
        id: m.id,
        account_id: m.user_id,
        token: m.token,
        expires_at: m.expires_at.with_timezone(&Utc),
        created_at: m.created_at.with_timezone(&Utc),
        revoked: m.revoked,
    }
}

fn duplicate_as_email_exists(e: ModelError) -> AuthError {
    match e {
        ModelError::Duplicate(_) => AuthError::EmailExists,
        other => other.into(),
    }
}

async fn load_profile<C: ConnectionTrait>(db: &C, account: &Account) -> Result<Option<RoleProfile>, AuthError> {
    let profile = match account.role {
        Role::Patient => patient::find_by_user(db, account.id).await?.map(|p| {
            RoleProfile::Patient(PatientProfile {
                patient_id: p.patient_id,
                first_name: p.first_name,
                last_name: p.last_name,
                full_name: p.full_name,
                date_of_birth: p.date_of_birth,
                gender: p.gender,
                medical_record_number: p.medical_record_number,
            })
        }),
        Role::Clinician => clinician::find_by_user(db, account.id).await?.map(|c| {
            RoleProfile::Clinician(ClinicianProfile {
                clinician_id: c.clinician_id,
                first_name: c.first_name,
                last_name: c.last_name,
                full_name: c.full_name,
                job_title: c.role,
                department: c.department,
                contact_info: c.contact_info,
                license_number: c.license_number,
            })
        }),
    };
    Ok(profile)
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn create_account_with_profile(&self, new: NewAccount<'_>) -> Result<Account, AuthError> {
        let password_hash = password::hash_blocking(new.password.to_string()).await?;

        let txn = self.db.begin().await?;
        let created = account::create(&txn, new.email, &password_hash, new.role.as_str())
            .await
            .map_err(duplicate_as_email_exists)?;
        match new.role {
            Role::Patient => {
                patient::create_default(&txn, created.id, new.first_name, new.last_name).await?;
            }
            Role::Clinician => {
                clinician::create_default(&txn, created.id, new.first_name, new.last_name).await?;
            }
        }
        txn.commit().await?;

        debug!(account_id = created.id, role = %new.role, "account_with_profile_committed");
        to_account(created)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Account, AuthError> {
        account::find_by_email(&self.db, email)
            .await?
            .ok_or(AuthError::NotFound)
            .and_then(to_account)
    }

    async fn get_account_by_id(&self, account_id: i32) -> Result<Account, AuthError> {
        account::find_by_id(&self.db, account_id)
            .await?
            .ok_or(AuthError::NotFound)
            .and_then(to_account)
    }

    async fn get_profile(&self, account_id: i32) -> Result<UserProfile, AuthError> {
        let account = self.get_account_by_id(account_id).await?;
        let profile = load_profile(&self.db, &account)
            .await?
            .ok_or(AuthError::ProfileMissing { account_id, role: account.role })?;
        Ok(UserProfile::new(&account, profile))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(account::email_exists(&self.db, email).await?)
    }

    async fn update_password_hash(&self, account_id: i32, password_hash: &str) -> Result<(), AuthError> {
        if account::update_password_hash(&self.db, account_id, password_hash).await? {
            Ok(())
        } else {
            Err(AuthError::NotFound)
        }
    }

    async fn save_refresh_token(&self, account_id: i32, token: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        refresh_token::create(&self.db, account_id, token, expires_at).await?;
        Ok(())
    }

    async fn validate_refresh_token(&self, token: &str) -> Result<StoredRefreshToken, AuthError> {
        refresh_token::find_active(&self.db, token, Utc::now())
            .await?
            .map(to_token)
            .ok_or(AuthError::InvalidToken)
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        match refresh_token::revoke(&self.db, token).await? {
            0 => Err(AuthError::InvalidToken),
            _ => Ok(()),
        }
    }

    async fn revoke_all_tokens_for_account(&self, account_id: i32) -> Result<u64, AuthError> {
        Ok(refresh_token::revoke_all_for_user(&self.db, account_id).await?)
    }

    async fn rotate_refresh_token(
        &self,
        old: &str,
        account_id: i32,
        new: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let txn = self.db.begin().await?;
        // Row lock from the conditional update serialises concurrent rotations.
        if refresh_token::revoke_if_active(&txn, old, Utc::now()).await? == 0 {
            return Err(AuthError::InvalidToken);
        }
        refresh_token::create(&txn, account_id, new, expires_at).await?;
        txn.commit().await?;
        Ok(())
    }
}
