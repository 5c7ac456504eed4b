//! Repository layer for data access.

pub mod entities;
mod memory;
mod refresh_token_repository;
mod user_repository;

pub use memory::{InMemoryRefreshTokenStore, InMemoryUserDirectory};
pub use refresh_token_repository::{RefreshTokenStore, RefreshTokenTable};
pub use user_repository::{UserDirectory, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use refresh_token_repository::MockRefreshTokenStore;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserDirectory;
