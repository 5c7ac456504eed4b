//! In-memory stores for tests and local experiments.
//!
//! Each store keeps its rows behind a single lock, so the conditional revoke
//! is a compare-and-swap performed while holding it.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{RefreshTokenStore, UserDirectory};
use common::{AppError, AppResult};
use domain::{RefreshToken, User};

/// Users keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        Ok(self.users.lock().values().any(|u| u.email == email))
    }

    async fn create(&self, email: String, password_hash: String, name: String) -> AppResult<User> {
        let mut users = self.users.lock();
        if users.values().any(|u| u.email == email) {
            return Err(AppError::already_exists("Email"));
        }

        let user = User::new(Uuid::new_v4(), email, password_hash, name, chrono::Utc::now());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.users
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }
}

/// Refresh token records keyed by token value.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    records: Mutex<HashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record regardless of its revocation state.
    pub fn get(&self, token: &str) -> Option<RefreshToken> {
        self.records.lock().get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of records that are still active.
    pub fn active_count(&self) -> usize {
        self.records.lock().values().filter(|r| r.is_active()).count()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn save(&self, record: RefreshToken) -> AppResult<RefreshToken> {
        let mut records = self.records.lock();
        if records.contains_key(&record.token) {
            return Err(AppError::internal("Duplicate refresh token value"));
        }
        records.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn find_active_by_value(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self
            .records
            .lock()
            .get(token)
            .filter(|r| r.is_active())
            .cloned())
    }

    async fn revoke(&self, token: &str, replacement: Option<String>) -> AppResult<u64> {
        let mut records = self.records.lock();
        match records.get_mut(token) {
            Some(record) if record.is_active() => {
                record.revoked = true;
                record.replaced_by = replacement;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, r| r.user_id != user_id);
        Ok((before - records.len()) as u64)
    }

    async fn find_all_for_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>> {
        let mut owned: Vec<RefreshToken> = self
            .records
            .lock()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|r| r.created_at);
        Ok(owned)
    }
}
