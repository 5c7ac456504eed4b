//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use auth_service_lib::clock::ManualClock;
use auth_service_lib::repository::{InMemoryRefreshTokenStore, InMemoryUserDirectory, RefreshTokenStore};
use auth_service_lib::security::{FakePasswordVerifier, InMemoryTokenIssuer};
use auth_service_lib::service::{AuthComponents, Authenticator};
use domain::NewUser;

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only-32chars";

/// Auth service over in-memory stores, with handles to inspect them.
pub struct TestApp {
    pub auth: Arc<Authenticator>,
    pub users: Arc<InMemoryUserDirectory>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenStore>,
    pub clock: ManualClock,
}

impl TestApp {
    pub fn new() -> Self {
        let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());
        Self::with_store(refresh_tokens.clone(), refresh_tokens)
    }

    /// Same wiring, but flows write through `store` while `inspect` is the
    /// underlying in-memory table.
    pub fn with_store(store: Arc<dyn RefreshTokenStore>, inspect: Arc<InMemoryRefreshTokenStore>) -> Self {
        let users = Arc::new(InMemoryUserDirectory::new());
        let clock = ManualClock::default();
        let components = AuthComponents {
            users: users.clone(),
            passwords: Arc::new(FakePasswordVerifier::new()),
            tokens: Arc::new(InMemoryTokenIssuer::new(Arc::new(clock.clone()))),
            refresh_tokens: store,
            clock: Arc::new(clock.clone()),
        };

        Self {
            auth: Arc::new(Authenticator::new(components)),
            users,
            refresh_tokens: inspect,
            clock,
        }
    }
}

pub fn dexter() -> NewUser {
    NewUser::new("dexter@x.com", "Dexter Morgan", "password123")
}
