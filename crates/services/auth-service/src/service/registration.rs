//! Registration: create the account, then issue tokens as login does.

use tracing::info;

use super::AuthComponents;
use common::{AppError, AppResult};
use domain::{validate_email, validate_name, AuthResult, NewUser};

/// Creates users and starts their first token family.
pub struct RegistrationService {
    components: AuthComponents,
}

impl RegistrationService {
    pub fn new(components: AuthComponents) -> Self {
        Self { components }
    }

    /// Input is validated before anything is written. The user row is
    /// committed before tokens are issued, so a failure during issuance
    /// leaves a valid account that can simply log in.
    pub async fn execute(&self, new_user: NewUser) -> AppResult<AuthResult> {
        validate_email(&new_user.email)?;
        validate_name(&new_user.name)?;

        if self.components.users.exists_by_email(&new_user.email).await? {
            return Err(AppError::already_exists("Email"));
        }

        let password_hash = self.components.passwords.encode(&new_user.password)?;
        let user = self
            .components
            .users
            .create(new_user.email, password_hash, new_user.name)
            .await?;
        info!(user_id = %user.id, "User registered");

        self.components.start_session(user).await
    }
}
