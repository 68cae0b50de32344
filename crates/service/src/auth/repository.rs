use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{Account, Role, StoredRefreshToken, UserProfile};
use super::errors::AuthError;

/// Fields for a new account plus its role profile. The password is plaintext;
/// implementations hash it before anything is written.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Repository abstraction over the credential store.
///
/// Lookups that miss return `NotFound`; token operations that miss return
/// `InvalidToken`. Store faults surface as `Repository`.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Account and profile are written together or not at all.
    async fn create_account_with_profile(&self, new: NewAccount<'_>) -> Result<Account, AuthError>;
    async fn get_account_by_email(&self, email: &str) -> Result<Account, AuthError>;
    async fn get_account_by_id(&self, account_id: i32) -> Result<Account, AuthError>;
    /// `NotFound` when the account is absent, `ProfileMissing` when only the profile is.
    async fn get_profile(&self, account_id: i32) -> Result<UserProfile, AuthError>;
    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;
    async fn update_password_hash(&self, account_id: i32, password_hash: &str) -> Result<(), AuthError>;

    async fn save_refresh_token(&self, account_id: i32, token: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError>;
    /// Only a non-revoked, unexpired token validates.
    async fn validate_refresh_token(&self, token: &str) -> Result<StoredRefreshToken, AuthError>;
    async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthError>;
    async fn revoke_all_tokens_for_account(&self, account_id: i32) -> Result<u64, AuthError>;
    /// Revoke `old` if still active and store `new`, atomically. If `old` was
    /// already consumed nothing is written and the result is `InvalidToken`.
    async fn rotate_refresh_token(
        &self,
        old: &str,
        account_id: i32,
        new: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;
}

/// Simple in-memory mock repository for tests, benches and doc examples
pub mod mock {
    use super::*;
    use crate::auth::domain::{ClinicianProfile, PatientProfile, RoleProfile};
    use crate::auth::password;
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    struct MockState {
        next_account_id: i32,
        next_token_id: i32,
        accounts: HashMap<i32, Account>,
        by_email: HashMap<String, i32>,
        profiles: HashMap<i32, RoleProfile>,
        tokens: HashMap<String, StoredRefreshToken>,
        fail_token_saves: bool,
    }

    #[derive(Default)]
    pub struct MockAuthRepository {
        state: Mutex<MockState>,
    }

    impl MockAuthRepository {
        fn state(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        /// Delete a profile row behind the repository's back.
        pub fn remove_profile(&self, account_id: i32) {
            self.state().profiles.remove(&account_id);
        }

        pub fn set_active(&self, account_id: i32, active: bool) {
            if let Some(account) = self.state().accounts.get_mut(&account_id) {
                account.is_active = active;
            }
        }

        /// Make `save_refresh_token` fail until switched back off.
        pub fn fail_token_saves(&self, fail: bool) {
            self.state().fail_token_saves = fail;
        }

        pub fn account_count(&self) -> usize {
            self.state().accounts.len()
        }

        pub fn active_token_count(&self, account_id: i32) -> usize {
            let now = Utc::now();
            self.state()
                .tokens
                .values()
                .filter(|t| t.account_id == account_id && t.is_active_at(now))
                .count()
        }

        fn insert_token(state: &mut MockState, account_id: i32, token: &str, expires_at: DateTime<Utc>) {
            state.next_token_id += 1;
            let row = StoredRefreshToken {
                id: state.next_token_id,
                account_id,
                token: token.to_string(),
                expires_at,
                created_at: Utc::now(),
                revoked: false,
            };
            state.tokens.insert(token.to_string(), row);
        }
    }

    fn default_profile(role: Role, account_id: i32, first_name: &str, last_name: &str) -> RoleProfile {
        let full_name = format!("{first_name} {last_name}");
        match role {
            Role::Patient => RoleProfile::Patient(PatientProfile {
                patient_id: account_id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                full_name,
                date_of_birth: models::patient::default_date_of_birth(),
                gender: models::patient::DEFAULT_GENDER.to_string(),
                medical_record_number: models::patient::medical_record_number_for(account_id),
            }),
            Role::Clinician => RoleProfile::Clinician(ClinicianProfile {
                clinician_id: account_id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                full_name,
                job_title: models::clinician::DEFAULT_JOB_TITLE.to_string(),
                department: models::clinician::DEFAULT_DEPARTMENT.to_string(),
                contact_info: models::clinician::DEFAULT_CONTACT_INFO.to_string(),
                license_number: models::clinician::license_number_for(account_id),
            }),
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn create_account_with_profile(&self, new: NewAccount<'_>) -> Result<Account, AuthError> {
            let password_hash = password::hash_blocking(new.password.to_string()).await?;
            let mut state = self.state();
            if state.by_email.contains_key(new.email) {
                return Err(AuthError::EmailExists);
            }
            state.next_account_id += 1;
            let id = state.next_account_id;
            let now = Utc::now();
            let account = Account {
                id,
                email: new.email.to_string(),
                password_hash,
                role: new.role,
                is_active: true,
                email_verified: false,
                created_at: now,
                updated_at: now,
            };
            state.by_email.insert(account.email.clone(), id);
            state.accounts.insert(id, account.clone());
            let profile = default_profile(new.role, id, new.first_name, new.last_name);
            state.profiles.insert(id, profile);
            Ok(account)
        }

        async fn get_account_by_email(&self, email: &str) -> Result<Account, AuthError> {
            let state = self.state();
            state
                .by_email
                .get(email)
                .and_then(|id| state.accounts.get(id))
                .cloned()
                .ok_or(AuthError::NotFound)
        }

        async fn get_account_by_id(&self, account_id: i32) -> Result<Account, AuthError> {
            self.state().accounts.get(&account_id).cloned().ok_or(AuthError::NotFound)
        }

        async fn get_profile(&self, account_id: i32) -> Result<UserProfile, AuthError> {
            let state = self.state();
            let account = state.accounts.get(&account_id).ok_or(AuthError::NotFound)?;
            let profile = state
                .profiles
                .get(&account_id)
                .filter(|p| p.role() == account.role)
                .cloned()
                .ok_or(AuthError::ProfileMissing { account_id, role: account.role })?;
            Ok(UserProfile::new(account, profile))
        }

        async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
            Ok(self.state().by_email.contains_key(email))
        }

        async fn update_password_hash(&self, account_id: i32, password_hash: &str) -> Result<(), AuthError> {
            let mut state = self.state();
            let account = state.accounts.get_mut(&account_id).ok_or(AuthError::NotFound)?;
            account.password_hash = password_hash.to_string();
            account.updated_at = Utc::now();
            Ok(())
        }

        async fn save_refresh_token(&self, account_id: i32, token: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
            let mut state = self.state();
            if state.fail_token_saves {
                return Err(AuthError::Repository("refresh token store unavailable".into()));
            }
            Self::insert_token(&mut state, account_id, token, expires_at);
            Ok(())
        }

        async fn validate_refresh_token(&self, token: &str) -> Result<StoredRefreshToken, AuthError> {
            let now = Utc::now();
            self.state()
                .tokens
                .get(token)
                .filter(|t| t.is_active_at(now))
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }

        async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthError> {
            let mut state = self.state();
            let row = state.tokens.get_mut(token).ok_or(AuthError::InvalidToken)?;
            row.revoked = true;
            Ok(())
        }

        async fn revoke_all_tokens_for_account(&self, account_id: i32) -> Result<u64, AuthError> {
            let mut revoked = 0;
            for row in self.state().tokens.values_mut() {
                if row.account_id == account_id && !row.revoked {
                    row.revoked = true;
                    revoked += 1;
                }
            }
            Ok(revoked)
        }

        async fn rotate_refresh_token(
            &self,
            old: &str,
            account_id: i32,
            new: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<(), AuthError> {
            let now = Utc::now();
            let mut state = self.state();
            match state.tokens.get_mut(old) {
                Some(row) if row.is_active_at(now) => row.revoked = true,
                _ => return Err(AuthError::InvalidToken),
            }
            Self::insert_token(&mut state, account_id, new, expires_at);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn new_patient(email: &str) -> NewAccount<'_> {
            NewAccount { email, password: "secret1", role: Role::Patient, first_name: "A", last_name: "B" }
        }

        #[tokio::test]
        async fn profile_defaults_follow_role() {
            let repo = MockAuthRepository::default();
            let account = repo.create_account_with_profile(new_patient("a@x.com")).await.unwrap();
            let profile = repo.get_profile(account.id).await.unwrap();
            match profile.profile {
                RoleProfile::Patient(p) => {
                    assert_eq!(p.full_name, "A B");
                    assert_eq!(p.gender, "Unknown");
                    assert_eq!(p.medical_record_number, format!("MRN-{}", account.id));
                }
                other => panic!("unexpected profile {other:?}"),
            }
        }

        #[tokio::test]
        async fn rotation_consumes_old_token_once() {
            let repo = MockAuthRepository::default();
            let exp = Utc::now() + chrono::Duration::days(1);
            repo.save_refresh_token(1, "old", exp).await.unwrap();
            repo.rotate_refresh_token("old", 1, "new", exp).await.unwrap();
            assert!(matches!(repo.rotate_refresh_token("old", 1, "newer", exp).await, Err(AuthError::InvalidToken)));
            assert!(repo.validate_refresh_token("new").await.is_ok());
            assert!(repo.validate_refresh_token("newer").await.is_err());
        }

        #[tokio::test]
        async fn revoke_missing_token_fails() {
            let repo = MockAuthRepository::default();
            assert!(matches!(repo.revoke_refresh_token("nope").await, Err(AuthError::InvalidToken)));
        }

        #[tokio::test]
        async fn expired_token_does_not_validate() {
            let repo = MockAuthRepository::default();
            repo.save_refresh_token(1, "t", Utc::now() - chrono::Duration::seconds(1)).await.unwrap();
            assert!(matches!(repo.validate_refresh_token("t").await, Err(AuthError::InvalidToken)));
        }
    }
}
