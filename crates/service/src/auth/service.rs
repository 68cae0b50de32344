use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use super::domain::{
    Account, AuthSession, ChangePasswordInput, LoginInput, RefreshInput, RegisterInput, Role, UserProfile,
};
use super::errors::AuthError;
use super::password;
use super::repository::{AuthRepository, NewAccount};
use super::token::{AccessClaims, TokenError, TokenIssuer};

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    tokens: TokenIssuer,
}

/// Profile name columns are `VARCHAR(100)`.
const MAX_NAME_LEN: usize = 100;

fn validate_name(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::Validation(format!("{field} must be at most {MAX_NAME_LEN} characters")));
    }
    Ok(())
}

fn validate_registration(input: &RegisterInput) -> Result<(), AuthError> {
    models::account::validate_email(&input.email)?;
    validate_name("first_name", &input.first_name)?;
    validate_name("last_name", &input.last_name)
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, tokens: TokenIssuer) -> Self {
        Self { repo, tokens }
    }

    /// Register an account with its role profile and open a session.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, RegisterInput, SigningSecret, TokenIssuer};
    /// use service::auth::repository::mock::MockAuthRepository;
    /// use std::sync::Arc;
    /// let tokens = TokenIssuer::new(SigningSecret::new("doc-secret").unwrap());
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), tokens);
    /// let input = RegisterInput {
    ///     email: "a@x.com".into(),
    ///     password: "secret1".into(),
    ///     first_name: "A".into(),
    ///     last_name: "B".into(),
    ///     role: "patient".into(),
    /// };
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.user.first_name, "A");
    /// assert!(!session.refresh_token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        validate_registration(&input)?;
        password::check_strength(&input.password)?;
        let role: Role = input.role.parse()?;
        if self.repo.email_exists(&input.email).await? {
            return Err(AuthError::EmailExists);
        }

        let account = self
            .repo
            .create_account_with_profile(NewAccount {
                email: &input.email,
                password: &input.password,
                role,
                first_name: &input.first_name,
                last_name: &input.last_name,
            })
            .await?;

        let access = self.tokens.issue_access(&account)?;
        let refresh = self.tokens.issue_refresh(account.id)?;
        self.repo.save_refresh_token(account.id, &refresh.token, refresh.expires_at).await?;

        // Written in this same call, so a miss here is never a plain NotFound.
        let user = match self.load_profile(&account).await {
            Err(AuthError::NotFound) => return Err(self.profile_missing(&account)),
            other => other?,
        };
        info!(account_id = account.id, role = %account.role, "account_registered");
        Ok(AuthSession { user, token: access.token, refresh_token: refresh.token })
    }

    /// Authenticate by email and password.
    ///
    /// Unknown email and wrong password are the same `InvalidCredentials`.
    /// Failure to persist the refresh token is logged and tolerated.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, LoginInput, RegisterInput, SigningSecret, TokenIssuer};
    /// use service::auth::repository::mock::MockAuthRepository;
    /// use std::sync::Arc;
    /// let tokens = TokenIssuer::new(SigningSecret::new("doc-secret").unwrap());
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), tokens);
    /// let reg = RegisterInput {
    ///     email: "u@e.com".into(),
    ///     password: "Passw0rd".into(),
    ///     first_name: "U".into(),
    ///     last_name: "E".into(),
    ///     role: "clinician".into(),
    /// };
    /// let _ = tokio_test::block_on(svc.register(reg));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let account = match self.repo.get_account_by_email(&input.email).await {
            Ok(account) => account,
            Err(AuthError::NotFound) => {
                password::verify_dummy(input.password).await?;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };
        if !account.is_active {
            return Err(AuthError::UserInactive);
        }
        if !password::verify_blocking(input.password, account.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let access = self.tokens.issue_access(&account)?;
        let refresh = self.tokens.issue_refresh(account.id)?;
        if let Err(e) = self.repo.save_refresh_token(account.id, &refresh.token, refresh.expires_at).await {
            warn!(account_id = account.id, error = %e, "refresh_token_save_failed");
        }

        let user = self.load_profile(&account).await?;
        info!(account_id = account.id, "login_succeeded");
        Ok(AuthSession { user, token: access.token, refresh_token: refresh.token })
    }

    /// Exchange a refresh token for a new pair. The presented token is
    /// consumed; replaying it fails with `InvalidToken`.
    #[instrument(skip(self, input))]
    pub async fn refresh_token(&self, input: RefreshInput) -> Result<AuthSession, AuthError> {
        let claims = self
            .tokens
            .verify_refresh(&input.refresh_token)
            .map_err(|_| AuthError::InvalidToken)?;
        let stored = self.repo.validate_refresh_token(&input.refresh_token).await?;
        if claims.account_id().ok() != Some(stored.account_id) {
            return Err(AuthError::InvalidToken);
        }

        let account = match self.repo.get_account_by_id(stored.account_id).await {
            Ok(account) => account,
            Err(AuthError::NotFound) => return Err(AuthError::InvalidToken),
            Err(e) => return Err(e),
        };
        if !account.is_active {
            return Err(AuthError::UserInactive);
        }

        let access = self.tokens.issue_access(&account)?;
        let refresh = self.tokens.issue_refresh(account.id)?;
        self.repo
            .rotate_refresh_token(&input.refresh_token, account.id, &refresh.token, refresh.expires_at)
            .await?;

        let user = self.load_profile(&account).await?;
        info!(account_id = account.id, "refresh_token_rotated");
        Ok(AuthSession { user, token: access.token, refresh_token: refresh.token })
    }

    /// Revoke every refresh token of the account. Access tokens stay valid
    /// until they expire.
    #[instrument(skip(self))]
    pub async fn logout(&self, account_id: i32) -> Result<u64, AuthError> {
        let revoked = self.repo.revoke_all_tokens_for_account(account_id).await?;
        info!(account_id, revoked, "logged_out");
        Ok(revoked)
    }

    #[instrument(skip(self, input))]
    pub async fn change_password(&self, account_id: i32, input: ChangePasswordInput) -> Result<(), AuthError> {
        let account = self.repo.get_account_by_id(account_id).await?;
        if !password::verify_blocking(input.old_password, account.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }
        password::check_strength(&input.new_password)?;
        let hash = password::hash_blocking(input.new_password).await?;
        self.repo.update_password_hash(account_id, &hash).await?;
        info!(account_id, "password_changed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, account_id: i32) -> Result<UserProfile, AuthError> {
        let profile = self.repo.get_profile(account_id).await;
        if let Err(AuthError::ProfileMissing { account_id, role }) = &profile {
            error!(account_id, role = %role, "profile_missing");
        }
        profile
    }

    /// Verify a bearer access token. Pure; no store access.
    pub fn authenticate(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.tokens.verify_access(token)
    }

    async fn load_profile(&self, account: &Account) -> Result<UserProfile, AuthError> {
        self.get_profile(account.id).await
    }

    fn profile_missing(&self, account: &Account) -> AuthError {
        error!(account_id = account.id, role = %account.role, "profile_missing");
        AuthError::ProfileMissing { account_id: account.id, role: account.role }
    }
}
