//! Auth module: domain types, password hashing, token issuing, repository
//! and the service that orchestrates them.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;

pub use domain::{
    Account, AuthSession, ChangePasswordInput, LoginInput, RefreshInput, RegisterInput, Role, RoleProfile,
    UserProfile,
};
pub use errors::AuthError;
pub use repository::AuthRepository;
pub use service::AuthService;
pub use token::{AccessClaims, SigningSecret, TokenError, TokenIssuer};
