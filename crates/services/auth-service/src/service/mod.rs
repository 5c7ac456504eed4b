//! Authentication service business logic.

mod auth_service;
mod authentication;
mod components;
mod registration;
mod token_refresh;

pub use auth_service::{AuthService, Authenticator};
pub use authentication::AuthenticationService;
pub use components::AuthComponents;
pub use registration::RegistrationService;
pub use token_refresh::TokenRefreshService;
