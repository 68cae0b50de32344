pub mod errors;
pub mod db;
pub mod account;
pub mod patient;
pub mod clinician;
pub mod refresh_token;

#[cfg(test)]
mod tests;
