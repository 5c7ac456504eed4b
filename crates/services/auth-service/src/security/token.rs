//! Access and refresh token issuance.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret. Expiry is
//! checked against the injected [`Clock`] rather than inside `jsonwebtoken`,
//! so issuance and validation agree on what "now" means.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use common::{AppError, AppResult, JwtConfig};
use domain::MIN_JWT_SECRET_LENGTH;

/// Which flow a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    pub kind: TokenKind,
    /// Random id, keeps two tokens minted in the same second distinct
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn new(subject: &str, kind: TokenKind, now: DateTime<Utc>, ttl: Duration) -> AppResult<Self> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::internal("Token expiry out of range"))?;

        Ok(Self {
            sub: subject.to_string(),
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Expiry instant as a timestamp.
    pub fn expires_at(&self) -> AppResult<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .ok_or(AppError::InvalidToken)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Token signing and parsing capability.
pub trait TokenIssuer: Send + Sync {
    /// Short-lived token authorizing individual calls.
    fn generate_access_token(&self, subject: &str) -> AppResult<String>;

    /// Long-lived token exchanged for a new pair.
    fn generate_refresh_token(&self, subject: &str) -> AppResult<String>;

    /// Verify signature and format, returning the claims.
    ///
    /// Expired tokens still parse; use [`TokenIssuer::validate`] for expiry.
    fn extract_claims(&self, token: &str) -> AppResult<Claims>;

    /// True iff the token parses, belongs to `expected_subject` and has not expired.
    fn validate(&self, token: &str, expected_subject: &str) -> bool;

    fn extract_expiration(&self, token: &str) -> AppResult<DateTime<Utc>> {
        self.extract_claims(token)?.expires_at()
    }

    fn extract_username(&self, token: &str) -> AppResult<String> {
        Ok(self.extract_claims(token)?.sub)
    }
}

/// Access and refresh lifetimes from config.
///
/// Rejects values that are not positive, or that push an expiry issued at
/// `now` past the representable range.
pub fn token_lifetimes(config: &JwtConfig, now: DateTime<Utc>) -> AppResult<(Duration, Duration)> {
    if config.access_token_ttl_minutes <= 0 || config.refresh_token_ttl_days <= 0 {
        return Err(AppError::validation("Token lifetimes must be positive"));
    }

    let access = Duration::try_minutes(config.access_token_ttl_minutes);
    let refresh = Duration::try_days(config.refresh_token_ttl_days);
    match (access, refresh) {
        (Some(access), Some(refresh))
            if now.checked_add_signed(access).is_some() && now.checked_add_signed(refresh).is_some() =>
        {
            Ok((access, refresh))
        }
        _ => Err(AppError::validation("Token lifetimes are out of range")),
    }
}

/// Production issuer backed by `jsonwebtoken`.
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenIssuer {
    /// Build the issuer. Keys are derived once and reused for every token.
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        if config.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::validation(format!(
                "JWT secret must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        let (access_ttl, refresh_ttl) = token_lifetimes(config, clock.now())?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
            validation,
            access_ttl,
            refresh_ttl,
            clock,
        })
    }

    fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token signing failed: {}", e)))
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn generate_access_token(&self, subject: &str) -> AppResult<String> {
        let claims = Claims::new(subject, TokenKind::Access, self.clock.now(), self.access_ttl)?;
        self.sign(&claims)
    }

    fn generate_refresh_token(&self, subject: &str) -> AppResult<String> {
        let claims = Claims::new(subject, TokenKind::Refresh, self.clock.now(), self.refresh_ttl)?;
        self.sign(&claims)
    }

    fn extract_claims(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Rejecting token: {}", e);
                AppError::InvalidToken
            })?;

        Ok(token_data.claims)
    }

    fn validate(&self, token: &str, expected_subject: &str) -> bool {
        match self.extract_claims(token) {
            Ok(claims) => claims.sub == expected_subject && !claims.is_expired_at(self.clock.now()),
            Err(_) => false,
        }
    }
}

/// In-memory double: tokens are random handles looked up in a table.
pub struct InMemoryTokenIssuer {
    issued: Mutex<HashMap<String, Claims>>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemoryTokenIssuer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttls(
            clock,
            Duration::minutes(domain::DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            Duration::days(domain::DEFAULT_REFRESH_TOKEN_TTL_DAYS),
        )
    }

    pub fn with_ttls(clock: Arc<dyn Clock>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            issued: Mutex::new(HashMap::new()),
            access_ttl,
            refresh_ttl,
            clock,
        }
    }

    fn mint(&self, subject: &str, kind: TokenKind, ttl: Duration) -> AppResult<String> {
        let claims = Claims::new(subject, kind, self.clock.now(), ttl)?;
        let prefix = match kind {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        };
        let token = format!("{}.{}", prefix, claims.jti.simple());
        self.issued.lock().insert(token.clone(), claims);
        Ok(token)
    }
}

impl TokenIssuer for InMemoryTokenIssuer {
    fn generate_access_token(&self, subject: &str) -> AppResult<String> {
        self.mint(subject, TokenKind::Access, self.access_ttl)
    }

    fn generate_refresh_token(&self, subject: &str) -> AppResult<String> {
        self.mint(subject, TokenKind::Refresh, self.refresh_ttl)
    }

    fn extract_claims(&self, token: &str) -> AppResult<Claims> {
        self.issued
            .lock()
            .get(token)
            .cloned()
            .ok_or(AppError::InvalidToken)
    }

    fn validate(&self, token: &str, expected_subject: &str) -> bool {
        match self.extract_claims(token) {
            Ok(claims) => claims.sub == expected_subject && !claims.is_expired_at(self.clock.now()),
            Err(_) => false,
        }
    }
}
