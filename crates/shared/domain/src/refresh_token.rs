//! Refresh token record and its rotation lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted refresh token.
///
/// A record starts active and is revoked exactly once, either by rotation
/// (with `replaced_by` pointing at its successor), by logout, or when it is
/// presented after expiry. Revoked records are never reactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    /// Opaque token value handed to the client
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
    /// Successor minted when this token was rotated
    pub replaced_by: Option<String>,
}

impl RefreshToken {
    /// Build a fresh, active record.
    pub fn issue(
        token: String,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            token,
            user_id,
            expires_at,
            created_at: now,
            revoked: false,
            replaced_by: None,
        }
    }

    /// Expired when the expiry instant is not strictly in the future.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_active(&self) -> bool {
        !self.revoked
    }
}
