//! Service layer for account authentication and token lifecycle.
//! - Business rules live here; persistence goes through `AuthRepository`.
//! - Entities and pool setup come from the `models` crate.

pub mod auth;
#[cfg(test)]
pub mod test_support;
