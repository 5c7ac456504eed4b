//! Authentication facade - the operations exposed to callers.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{AuthComponents, AuthenticationService, RegistrationService, TokenRefreshService};
use crate::security::TokenKind;
use common::{AppError, AppResult, OptionExt};
use domain::{Credentials, NewUser, TokenPair};

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Log in with email and password
    async fn authenticate(&self, credentials: Credentials) -> AppResult<TokenPair>;

    /// Create an account and log it in
    async fn register(&self, new_user: NewUser) -> AppResult<TokenPair>;

    /// Rotate a refresh token
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// Revoke a refresh token without issuing a successor
    async fn logout(&self, refresh_token: &str) -> AppResult<()>;

    /// Check an access token and return its subject
    fn verify_access_token(&self, token: &str) -> AppResult<String>;

    /// Delete a user together with all of their refresh tokens
    async fn delete_account(&self, user_id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of AuthService composing the individual flows.
pub struct Authenticator {
    authentication: AuthenticationService,
    registration: RegistrationService,
    token_refresh: TokenRefreshService,
    components: AuthComponents,
}

impl Authenticator {
    /// Create new auth service instance
    pub fn new(components: AuthComponents) -> Self {
        Self {
            authentication: AuthenticationService::new(components.clone()),
            registration: RegistrationService::new(components.clone()),
            token_refresh: TokenRefreshService::new(components.clone()),
            components,
        }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn authenticate(&self, credentials: Credentials) -> AppResult<TokenPair> {
        self.authentication.execute(credentials).await.map(TokenPair::from)
    }

    async fn register(&self, new_user: NewUser) -> AppResult<TokenPair> {
        self.registration.execute(new_user).await.map(TokenPair::from)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        self.token_refresh.execute(refresh_token).await.map(TokenPair::from)
    }

    async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let revoked = self
            .components
            .refresh_tokens
            .revoke(refresh_token, None)
            .await?;

        if revoked == 0 {
            return Err(AppError::InvalidRefreshToken);
        }
        info!("Refresh token revoked on logout");
        Ok(())
    }

    fn verify_access_token(&self, token: &str) -> AppResult<String> {
        let claims = self.components.tokens.extract_claims(token)?;
        if claims.kind != TokenKind::Access || !self.components.tokens.validate(token, &claims.sub) {
            return Err(AppError::InvalidToken);
        }
        Ok(claims.sub)
    }

    async fn delete_account(&self, user_id: Uuid) -> AppResult<()> {
        self.components
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_not_found()?;

        let removed = self
            .components
            .refresh_tokens
            .delete_all_for_user(user_id)
            .await?;
        self.components.users.delete(user_id).await?;

        info!(%user_id, removed_tokens = removed, "Account deleted");
        Ok(())
    }
}
