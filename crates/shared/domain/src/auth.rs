//! Results returned by the authentication flows.

use serde::Serialize;

use crate::constants::TOKEN_TYPE_BEARER;
use crate::user::{User, UserSummary};

/// Outcome of login, registration or rotation.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Token pair as handed back to callers.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,
    /// Opaque refresh token, single use
    pub refresh_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    pub user: UserSummary,
}

impl From<AuthResult> for TokenPair {
    fn from(result: AuthResult) -> Self {
        Self {
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            user: UserSummary::from(result.user),
        }
    }
}
