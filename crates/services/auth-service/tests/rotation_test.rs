//! Refresh token lifecycle across login, rotation, expiry and logout.

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Barrier;
use uuid::Uuid;

use auth_service_lib::clock::{Clock, ManualClock};
use auth_service_lib::repository::{InMemoryRefreshTokenStore, RefreshTokenStore};
use auth_service_lib::security::{Argon2PasswordVerifier, JwtTokenIssuer};
use auth_service_lib::service::{AuthComponents, AuthService, Authenticator};
use common::{AppError, AppResult, JwtConfig};
use support::{dexter, TestApp, JWT_SECRET};
use domain::{Credentials, RefreshToken};

// =============================================================================
// Rotation
// =============================================================================

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let app = TestApp::new();

    let registered = app.auth.register(dexter()).await.unwrap();
    let r1 = registered.refresh_token;

    let rotated = app.auth.refresh(&r1).await.unwrap();
    assert_ne!(rotated.refresh_token, r1);
    assert_ne!(rotated.access_token, registered.access_token);

    let replay = app.auth.refresh(&r1).await;
    assert!(matches!(replay, Err(AppError::InvalidRefreshToken)));

    // The successor is unaffected by the replay
    assert!(app.auth.refresh(&rotated.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_rotation_chain_is_linked() {
    let app = TestApp::new();
    let first = app.auth.register(dexter()).await.unwrap();

    let mut current = first.refresh_token.clone();
    let mut chain = vec![current.clone()];
    for _ in 0..3 {
        current = app.auth.refresh(&current).await.unwrap().refresh_token;
        chain.push(current.clone());
    }

    for pair in chain.windows(2) {
        let record = app.refresh_tokens.get(&pair[0]).unwrap();
        assert!(record.revoked);
        assert_eq!(record.replaced_by.as_deref(), Some(pair[1].as_str()));
    }

    let family = app
        .refresh_tokens
        .find_all_for_user(first.user.id)
        .await
        .unwrap();
    assert_eq!(family.len(), 4);
    assert_eq!(family.iter().filter(|r| r.is_active()).count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rotations_have_one_winner() {
    let app = TestApp::new();
    let r1 = app.auth.register(dexter()).await.unwrap().refresh_token;

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let auth = app.auth.clone();
            let token = r1.clone();
            tokio::spawn(async move { auth.refresh(&token).await })
        })
        .collect();

    let outcomes: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);

    for outcome in &outcomes {
        if let Err(e) = outcome {
            assert!(
                matches!(e, AppError::ConcurrencyConflict | AppError::InvalidRefreshToken),
                "unexpected error: {:?}",
                e
            );
        }
    }

    let original = app.refresh_tokens.get(&r1).unwrap();
    assert!(original.revoked);
    assert_eq!(original.replaced_by.as_deref(), Some(winners[0].refresh_token.as_str()));
}

/// Holds every lookup until two requests have both read the record.
struct LockstepStore {
    inner: Arc<InMemoryRefreshTokenStore>,
    both_read: Barrier,
}

#[async_trait]
impl RefreshTokenStore for LockstepStore {
    async fn save(&self, record: RefreshToken) -> AppResult<RefreshToken> {
        self.inner.save(record).await
    }

    async fn find_active_by_value(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        let found = self.inner.find_active_by_value(token).await;
        self.both_read.wait().await;
        found
    }

    async fn revoke(&self, token: &str, replacement: Option<String>) -> AppResult<u64> {
        self.inner.revoke(token, replacement).await
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        self.inner.delete_all_for_user(user_id).await
    }

    async fn find_all_for_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>> {
        self.inner.find_all_for_user(user_id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rotation_that_loses_the_revoke_is_a_conflict() {
    let inner = Arc::new(InMemoryRefreshTokenStore::new());
    let lockstep = Arc::new(LockstepStore {
        inner: inner.clone(),
        both_read: Barrier::new(2),
    });
    let app = TestApp::with_store(lockstep, inner);
    let r1 = app.auth.register(dexter()).await.unwrap().refresh_token;

    let first = {
        let auth = app.auth.clone();
        let token = r1.clone();
        tokio::spawn(async move { auth.refresh(&token).await })
    };
    let second = {
        let auth = app.auth.clone();
        let token = r1.clone();
        tokio::spawn(async move { auth.refresh(&token).await })
    };
    let outcomes = [first.await.unwrap(), second.await.unwrap()];

    let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    let conflicts = outcomes
        .iter()
        .filter(|o| matches!(o, Err(AppError::ConcurrencyConflict)))
        .count();
    assert_eq!(winners.len(), 1);
    assert_eq!(conflicts, 1);

    // Only the winner's successor is linked; the loser's stays unreachable
    let original = app.refresh_tokens.get(&r1).unwrap();
    assert_eq!(original.replaced_by.as_deref(), Some(winners[0].refresh_token.as_str()));
    assert_eq!(app.refresh_tokens.len(), 3);
}

// =============================================================================
// Expiry and revocation
// =============================================================================

#[tokio::test]
async fn test_expired_refresh_token_is_rejected_and_revoked() {
    let app = TestApp::new();
    let r1 = app.auth.register(dexter()).await.unwrap().refresh_token;

    app.clock.advance(Duration::days(7) + Duration::seconds(1));

    assert!(matches!(app.auth.refresh(&r1).await, Err(AppError::InvalidRefreshToken)));
    let record = app.refresh_tokens.get(&r1).unwrap();
    assert!(record.revoked);
    assert!(record.replaced_by.is_none());
}

#[tokio::test]
async fn test_refresh_just_before_expiry_succeeds() {
    let app = TestApp::new();
    let r1 = app.auth.register(dexter()).await.unwrap().refresh_token;

    app.clock.advance(Duration::days(7) - Duration::seconds(2));
    assert!(app.auth.refresh(&r1).await.is_ok());
}

#[tokio::test]
async fn test_unknown_refresh_token() {
    let app = TestApp::new();
    assert!(matches!(
        app.auth.refresh("refresh.never-issued").await,
        Err(AppError::InvalidRefreshToken)
    ));
}

#[tokio::test]
async fn test_logout_ends_the_family() {
    let app = TestApp::new();
    let pair = app.auth.register(dexter()).await.unwrap();

    app.auth.logout(&pair.refresh_token).await.unwrap();

    assert!(matches!(
        app.auth.refresh(&pair.refresh_token).await,
        Err(AppError::InvalidRefreshToken)
    ));
    assert_eq!(app.refresh_tokens.active_count(), 0);
}

#[tokio::test]
async fn test_deleted_account_cannot_refresh() {
    let app = TestApp::new();
    let pair = app.auth.register(dexter()).await.unwrap();

    app.auth.delete_account(pair.user.id).await.unwrap();

    assert!(app.refresh_tokens.is_empty());
    assert!(matches!(
        app.auth.refresh(&pair.refresh_token).await,
        Err(AppError::InvalidRefreshToken)
    ));
    assert!(matches!(
        app.auth.authenticate(Credentials::new("dexter@x.com", "password123")).await,
        Err(AppError::AuthenticationFailed)
    ));
}

// =============================================================================
// Login and registration
// =============================================================================

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.auth.register(dexter()).await.unwrap();

    let wrong_password = app
        .auth
        .authenticate(Credentials::new("dexter@x.com", "password124"))
        .await
        .unwrap_err();
    let unknown_email = app
        .auth
        .authenticate(Credentials::new("harry@x.com", "password123"))
        .await
        .unwrap_err();

    assert_eq!(wrong_password.code(), unknown_email.code());
    assert_eq!(wrong_password.status(), unknown_email.status());
    assert_eq!(wrong_password.user_message(), unknown_email.user_message());
}

#[tokio::test]
async fn test_registration_validation() {
    let app = TestApp::new();

    let bad_email = app
        .auth
        .register(domain::NewUser::new("no-at-sign", "Dexter Morgan", "password123"))
        .await;
    let short_name = app
        .auth
        .register(domain::NewUser::new("dexter@x.com", "Dx", "password123"))
        .await;

    assert!(matches!(bad_email, Err(AppError::Validation(_))));
    assert!(matches!(short_name, Err(AppError::Validation(_))));
    assert!(app.users.is_empty());
    assert!(app.refresh_tokens.is_empty());
}

#[tokio::test]
async fn test_duplicate_registration() {
    let app = TestApp::new();
    app.auth.register(dexter()).await.unwrap();

    let err = app.auth.register(dexter()).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));
    assert_eq!(err.user_message(), "Email already exists");
}

/// Fails the first save, then behaves like the wrapped store.
struct FlakyStore {
    inner: Arc<InMemoryRefreshTokenStore>,
    failed: AtomicBool,
}

#[async_trait]
impl RefreshTokenStore for FlakyStore {
    async fn save(&self, record: RefreshToken) -> AppResult<RefreshToken> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(AppError::internal("simulated outage"));
        }
        self.inner.save(record).await
    }

    async fn find_active_by_value(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        self.inner.find_active_by_value(token).await
    }

    async fn revoke(&self, token: &str, replacement: Option<String>) -> AppResult<u64> {
        self.inner.revoke(token, replacement).await
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        self.inner.delete_all_for_user(user_id).await
    }

    async fn find_all_for_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>> {
        self.inner.find_all_for_user(user_id).await
    }
}

#[tokio::test]
async fn test_failed_issuance_after_registration_allows_login() {
    let inner = Arc::new(InMemoryRefreshTokenStore::new());
    let flaky = Arc::new(FlakyStore {
        inner: inner.clone(),
        failed: AtomicBool::new(false),
    });
    let app = TestApp::with_store(flaky, inner);

    assert!(app.auth.register(dexter()).await.is_err());
    assert_eq!(app.users.len(), 1);

    let pair = app
        .auth
        .authenticate(Credentials::new("dexter@x.com", "password123"))
        .await
        .unwrap();
    assert!(app.refresh_tokens.get(&pair.refresh_token).unwrap().is_active());
}

// =============================================================================
// Production primitives
// =============================================================================

#[tokio::test]
async fn test_rotation_with_argon2_and_signed_tokens() {
    let clock = ManualClock::default();
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let jwt = JwtConfig {
        secret: JWT_SECRET.to_string(),
        ..JwtConfig::default()
    };
    let store = Arc::new(InMemoryRefreshTokenStore::new());

    let components = AuthComponents {
        users: Arc::new(auth_service_lib::repository::InMemoryUserDirectory::new()),
        passwords: Arc::new(Argon2PasswordVerifier::new().unwrap()),
        tokens: Arc::new(JwtTokenIssuer::new(&jwt, shared_clock.clone()).unwrap()),
        refresh_tokens: store.clone(),
        clock: shared_clock,
    };
    let auth = Authenticator::new(components);

    let registered = auth.register(dexter()).await.unwrap();
    assert_eq!(auth.verify_access_token(&registered.access_token).unwrap(), "dexter@x.com");

    // Tokens minted within the same second still differ
    let rotated = auth.refresh(&registered.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, registered.refresh_token);

    let stored = store.get(&rotated.refresh_token).unwrap();
    assert!(stored.expires_at > clock.now() + Duration::days(6));

    let logged_in = auth
        .authenticate(Credentials::new("dexter@x.com", "password123"))
        .await
        .unwrap();
    assert_eq!(logged_in.user.id, registered.user.id);
}
