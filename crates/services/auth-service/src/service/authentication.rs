//! Login: credential check followed by token issuance.

use tracing::{info, warn};

use super::AuthComponents;
use common::{AppError, AppResult};
use domain::{AuthResult, Credentials};

/// Verifies credentials and starts a token family.
pub struct AuthenticationService {
    components: AuthComponents,
}

impl AuthenticationService {
    pub fn new(components: AuthComponents) -> Self {
        Self { components }
    }

    /// Every failure, unknown email or wrong password alike, is the same
    /// [`AppError::AuthenticationFailed`].
    pub async fn execute(&self, credentials: Credentials) -> AppResult<AuthResult> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(AppError::AuthenticationFailed);
        }

        let found = self.components.users.find_by_email(&credentials.email).await?;

        // Verify against a decoy when the account is unknown so both failure
        // paths do the same amount of hashing work.
        let stored_hash = match &found {
            Some(user) => user.password_hash.as_str(),
            None => self.components.passwords.decoy_hash(),
        };
        let password_valid = self
            .components
            .passwords
            .matches(&credentials.password, stored_hash);

        let user = match found {
            Some(user) if password_valid => user,
            _ => {
                warn!("Login rejected");
                return Err(AppError::AuthenticationFailed);
            }
        };

        let result = self.components.start_session(user).await?;
        info!(user_id = %result.user.id, "User logged in");
        Ok(result)
    }
}
