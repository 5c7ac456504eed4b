//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.

pub mod auth;
pub mod constants;
pub mod error;
pub mod refresh_token;
pub mod user;
pub mod validation;

pub use auth::{AuthResult, TokenPair};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use refresh_token::RefreshToken;
pub use user::{Credentials, NewUser, User, UserRole, UserSummary};
pub use validation::{validate_email, validate_name};
