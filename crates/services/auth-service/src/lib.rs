//! Auth Service Library
//!
//! Email/password authentication issuing short-lived access tokens and
//! single-use refresh tokens that rotate on every exchange.

pub mod api;
pub mod clock;
pub mod config;
pub mod infra;
pub mod repository;
pub mod security;
pub mod service;

use std::sync::Arc;

use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::AuthServiceConfig;
use crate::infra::Database;
use crate::service::{AuthComponents, Authenticator};
use common::{AppError, AppResult, DatabaseConfig};

/// Run the HTTP server with the given configuration.
pub async fn run_server(config: AuthServiceConfig) -> AppResult<()> {
    // Initialize database
    let db = Database::connect(&config.database).await?;

    // Create auth service
    let components = AuthComponents::from_connection(db.get_connection(), &config.jwt)?;
    let auth_service = Arc::new(Authenticator::new(components));

    let app = create_router(AppState::new(auth_service, db));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Auth service listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(database: &DatabaseConfig, action: MigrateAction) -> AppResult<()> {
    let db = Database::connect_without_migrations(database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
