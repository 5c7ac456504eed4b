//! Refresh token rotation.
//!
//! A refresh token is either active or revoked, and revoked is terminal.
//! Rotation reads the active record, checks it, writes the successor, and
//! only then revokes the presented token through the store's conditional
//! update. That revoke is the last write: when two requests present the same
//! token, both may insert a successor, but only one revoke reports a changed
//! row and only that request hands its tokens out. The loser's successor is
//! never returned to anyone.

use tracing::{debug, info, warn};

use super::AuthComponents;
use crate::security::TokenKind;
use common::{AppError, AppResult};
use domain::AuthResult;

/// Exchanges a refresh token for a new pair, invalidating the old one.
pub struct TokenRefreshService {
    components: AuthComponents,
}

impl TokenRefreshService {
    pub fn new(components: AuthComponents) -> Self {
        Self { components }
    }

    pub async fn execute(&self, presented: &str) -> AppResult<AuthResult> {
        let c = &self.components;

        // 1. Only active records qualify. Unknown, rotated and forged tokens
        //    all end here with the same error.
        let current = c
            .refresh_tokens
            .find_active_by_value(presented)
            .await?
            .ok_or_else(|| {
                debug!("Refresh token not found or already revoked");
                AppError::InvalidRefreshToken
            })?;

        // 2. Expiry is judged now, against the stored instant.
        if current.is_expired_at(c.clock.now()) {
            c.refresh_tokens.revoke(presented, None).await?;
            debug!(token_id = %current.id, "Expired refresh token revoked");
            return Err(AppError::InvalidRefreshToken);
        }

        // 3. The token must also verify on its own, independent of the row.
        let claims = c.tokens.extract_claims(presented).map_err(|_| {
            warn!(token_id = %current.id, "Stored refresh token failed verification");
            AppError::InvalidRefreshToken
        })?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::InvalidRefreshToken);
        }

        // 4. The subject must still resolve to a user.
        let user = c
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::integrity("User associated with refresh token not found"))?;

        // 5. ...and that user must own the record.
        if current.user_id != user.id {
            warn!(token_id = %current.id, "Refresh token owner mismatch");
            return Err(AppError::InvalidRefreshToken);
        }

        // 6-7. Mint and persist the successor.
        let minted = c.mint(&user.email)?;
        c.refresh_tokens.save(c.record_for(&user, &minted)).await?;

        // 8. Claim the presented token. Zero rows means another request got
        //    there first; the successor saved above stays unreachable.
        let claimed = c
            .refresh_tokens
            .revoke(presented, Some(minted.refresh_token.clone()))
            .await?;
        if claimed == 0 {
            warn!(user_id = %user.id, "Lost refresh token rotation race");
            return Err(AppError::ConcurrencyConflict);
        }

        info!(user_id = %user.id, "Refresh token rotated");
        Ok(AuthResult {
            user,
            access_token: minted.access_token,
            refresh_token: minted.refresh_token,
        })
    }
}
