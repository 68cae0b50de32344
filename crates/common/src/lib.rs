//! Shared building blocks for the wound-assessment API crates.

pub mod types;
pub mod utils;
