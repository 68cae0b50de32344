//! Concrete `AuthRepository` implementations.

pub mod seaorm;

pub use seaorm::SeaOrmAuthRepository;
