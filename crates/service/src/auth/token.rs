//! HS256 access and refresh tokens signed with one shared secret.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::domain::{Account, Role};
use super::errors::AuthError;

pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

const TYP_ACCESS: &str = "access";
const TYP_REFRESH: &str = "refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token or bad signature")]
    Malformed,
    #[error("token expired")]
    Expired,
}

/// Non-empty HMAC key material. Never printed.
#[derive(Clone)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AuthError::TokenError("signing secret must not be empty".into()));
        }
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    pub typ: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn account_id(&self) -> Result<i32, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Malformed)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AuthError::TokenError("token lifetime out of range".into()))
}

/// Signs and verifies both token kinds. Built once at startup and shared.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: SigningSecret) -> Self {
        Self::with_ttls(
            secret,
            Duration::hours(ACCESS_TOKEN_TTL_HOURS),
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
        )
    }

    pub fn with_ttls(secret: SigningSecret, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_access(&self, account: &Account) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = expiry(now, self.access_ttl)?;
        let claims = AccessClaims {
            sub: account.id.to_string(),
            user_id: account.id,
            email: account.email.clone(),
            role: account.role,
            typ: TYP_ACCESS.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok(IssuedToken { token: self.sign(&claims)?, expires_at })
    }

    pub fn issue_refresh(&self, account_id: i32) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = expiry(now, self.refresh_ttl)?;
        let claims = RefreshClaims {
            sub: account_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            typ: TYP_REFRESH.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok(IssuedToken { token: self.sign(&claims)?, expires_at })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.verify(token, true)?;
        if claims.typ != TYP_ACCESS || claims.sub != claims.user_id.to_string() {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.verify(token, false)?;
        if claims.typ != TYP_REFRESH {
            return Err(TokenError::Malformed);
        }
        claims.account_id()?;
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, check_nbf: bool) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = check_nbf;
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: 7,
            email: "a@x.com".into(),
            password_hash: String::new(),
            role: Role::Clinician,
            is_active: true,
            email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(SigningSecret::new(secret).unwrap())
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(SigningSecret::new("").is_err());
        assert!(SigningSecret::new("  ").is_err());
        assert_eq!(format!("{:?}", SigningSecret::new("k").unwrap()), "SigningSecret(***)");
    }

    #[test]
    fn access_round_trip_carries_identity() {
        let tokens = issuer("k1");
        let issued = tokens.issue_access(&account()).unwrap();
        let claims = tokens.verify_access(&issued.token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Clinician);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn refresh_tokens_are_unique_within_a_second() {
        let tokens = issuer("k1");
        let a = tokens.issue_refresh(7).unwrap();
        let b = tokens.issue_refresh(7).unwrap();
        assert_ne!(a.token, b.token);
        let claims = tokens.verify_refresh(&a.token).unwrap();
        assert_eq!(claims.account_id().unwrap(), 7);
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_DAYS * 86400);
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let issued = issuer("k1").issue_access(&account()).unwrap();
        assert_eq!(issuer("k2").verify_access(&issued.token), Err(TokenError::Malformed));
        assert_eq!(issuer("k1").verify_access("not.a.jwt"), Err(TokenError::Malformed));
    }

    #[test]
    fn expired_is_distinct_from_malformed() {
        let secret = SigningSecret::new("k1").unwrap();
        let tokens = TokenIssuer::with_ttls(secret, Duration::hours(-1), Duration::days(-1));
        let access = tokens.issue_access(&account()).unwrap();
        let refresh = tokens.issue_refresh(7).unwrap();
        assert_eq!(tokens.verify_access(&access.token), Err(TokenError::Expired));
        assert_eq!(tokens.verify_refresh(&refresh.token), Err(TokenError::Expired));
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        let secret = SigningSecret::new("k1").unwrap();
        let tokens = TokenIssuer::with_ttls(secret, Duration::days(100_000_000), Duration::days(100_000_000));
        assert!(matches!(tokens.issue_refresh(7), Err(AuthError::TokenError(_))));
        assert!(matches!(tokens.issue_access(&account()), Err(AuthError::TokenError(_))));
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let tokens = issuer("k1");
        let access = tokens.issue_access(&account()).unwrap();
        let refresh = tokens.issue_refresh(7).unwrap();
        assert_eq!(tokens.verify_access(&refresh.token), Err(TokenError::Malformed));
        assert_eq!(tokens.verify_refresh(&access.token), Err(TokenError::Malformed));
    }
}
