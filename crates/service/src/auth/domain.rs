use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;

/// Account role. Closed set: anything else is rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Clinician,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Clinician => models::account::ROLE_CLINICIAN,
            Role::Patient => models::account::ROLE_PATIENT,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            models::account::ROLE_CLINICIAN => Ok(Role::Clinician),
            models::account::ROLE_PATIENT => Ok(Role::Patient),
            other => Err(AuthError::InvalidRole(other.to_string())),
        }
    }
}

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Parsed into [`Role`] by the service so an unknown value maps to `InvalidRole`.
    pub role: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
}

/// Authentication identity as stored. The hash never leaves the service boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub patient_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub medical_record_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicianProfile {
    pub clinician_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub job_title: String,
    pub department: String,
    pub contact_info: String,
    pub license_number: String,
}

/// Role-specific profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleProfile {
    Patient(PatientProfile),
    Clinician(ClinicianProfile),
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Patient(_) => Role::Patient,
            RoleProfile::Clinician(_) => Role::Clinician,
        }
    }

    pub fn first_name(&self) -> &str {
        match self {
            RoleProfile::Patient(p) => &p.first_name,
            RoleProfile::Clinician(c) => &c.first_name,
        }
    }

    pub fn last_name(&self) -> &str {
        match self {
            RoleProfile::Patient(p) => &p.last_name,
            RoleProfile::Clinician(c) => &c.last_name,
        }
    }
}

/// Account joined with its profile; what clients see as `user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile: RoleProfile,
}

impl UserProfile {
    pub fn new(account: &Account, profile: RoleProfile) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            first_name: profile.first_name().to_string(),
            last_name: profile.last_name().to_string(),
            role: account.role,
            is_active: account.is_active,
            email_verified: account.email_verified,
            created_at: account.created_at,
            updated_at: account.updated_at,
            profile,
        }
    }
}

/// Persisted refresh-token row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRefreshToken {
    pub id: i32,
    pub account_id: i32,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl StoredRefreshToken {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }
}

/// Result of register / login / refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
    pub refresh_token: String,
}
