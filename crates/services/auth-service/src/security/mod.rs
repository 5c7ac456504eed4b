//! Credential primitives: password hashing and token issuance.

mod password;
mod token;

pub use password::{Argon2PasswordVerifier, FakePasswordVerifier, PasswordVerifier};
pub use token::{token_lifetimes, Claims, InMemoryTokenIssuer, JwtTokenIssuer, TokenIssuer, TokenKind};
