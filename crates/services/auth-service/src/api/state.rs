//! Application state shared by the HTTP handlers.

use std::sync::Arc;

use crate::infra::Database;
use crate::service::AuthService;

/// Services reachable from a request.
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// Database handle, absent when running on in-memory stores
    pub database: Option<Database>,
}

impl AppState {
    /// State backed by a live database.
    pub fn new(auth_service: Arc<dyn AuthService>, database: Database) -> Self {
        Self {
            auth_service,
            database: Some(database),
        }
    }

    /// State without a database (tests and local runs).
    pub fn detached(auth_service: Arc<dyn AuthService>) -> Self {
        Self {
            auth_service,
            database: None,
        }
    }
}
