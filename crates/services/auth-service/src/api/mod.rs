//! HTTP surface of the auth service.

mod handlers;
mod routes;
mod state;

pub use handlers::{LoginRequest, RefreshRequest, RegisterRequest, VerifyResponse};
pub use routes::create_router;
pub use state::AppState;
