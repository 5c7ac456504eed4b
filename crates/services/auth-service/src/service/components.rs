//! Capabilities shared by the authentication flows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::clock::{Clock, SystemClock};
use crate::repository::{RefreshTokenStore, RefreshTokenTable, UserDirectory, UserStore};
use crate::security::{Argon2PasswordVerifier, JwtTokenIssuer, PasswordVerifier, TokenIssuer};
use common::{AppResult, JwtConfig};
use domain::{AuthResult, RefreshToken, User};

/// Everything a flow may depend on, each behind its own trait.
#[derive(Clone)]
pub struct AuthComponents {
    pub users: Arc<dyn UserDirectory>,
    pub passwords: Arc<dyn PasswordVerifier>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub clock: Arc<dyn Clock>,
}

/// Freshly signed tokens, not yet persisted.
pub(crate) struct MintedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

impl AuthComponents {
    /// Production wiring: SeaORM stores, Argon2id, signed JWTs, wall clock.
    pub fn from_connection(db: DatabaseConnection, jwt: &JwtConfig) -> AppResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Ok(Self {
            users: Arc::new(UserStore::new(db.clone())),
            passwords: Arc::new(Argon2PasswordVerifier::new()?),
            tokens: Arc::new(JwtTokenIssuer::new(jwt, clock.clone())?),
            refresh_tokens: Arc::new(RefreshTokenTable::new(db)),
            clock,
        })
    }

    /// Sign an access and a refresh token for `subject`.
    pub(crate) fn mint(&self, subject: &str) -> AppResult<MintedTokens> {
        let access_token = self.tokens.generate_access_token(subject)?;
        let refresh_token = self.tokens.generate_refresh_token(subject)?;
        let refresh_expires_at = self.tokens.extract_expiration(&refresh_token)?;

        Ok(MintedTokens {
            access_token,
            refresh_token,
            refresh_expires_at,
        })
    }

    /// Active record for a minted refresh token owned by `user`.
    pub(crate) fn record_for(&self, user: &User, minted: &MintedTokens) -> RefreshToken {
        RefreshToken::issue(
            minted.refresh_token.clone(),
            user.id,
            minted.refresh_expires_at,
            self.clock.now(),
        )
    }

    /// Mint and persist a new token pair: the start of a token family.
    pub(crate) async fn start_session(&self, user: User) -> AppResult<AuthResult> {
        let minted = self.mint(&user.email)?;
        self.refresh_tokens
            .save(self.record_for(&user, &minted))
            .await?;

        Ok(AuthResult {
            user,
            access_token: minted.access_token,
            refresh_token: minted.refresh_token,
        })
    }
}

#[cfg(test)]
impl AuthComponents {
    /// Fake hashing and in-memory tokens over the given stores and clock.
    pub(crate) fn for_tests(
        users: Arc<dyn UserDirectory>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        clock: crate::clock::ManualClock,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        Self {
            users,
            passwords: Arc::new(crate::security::FakePasswordVerifier::new()),
            tokens: Arc::new(crate::security::InMemoryTokenIssuer::new(clock.clone())),
            refresh_tokens,
            clock,
        }
    }
}
