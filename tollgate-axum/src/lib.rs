//! # Tollgate Axum Integration
//!
//! This crate provides Axum routes and middleware for tollgate brute force protection.
//!
//! ## Features
//!
//! - **Login route**: runs each login through the account and IP lockout checks and
//!   answers `429 Too Many Requests` with a `Retry-After` header while locked
//! - **Lock status routes**: point-in-time lock state of an account or address
//! - **IP gate middleware**: keep locked addresses away from any other route
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::{net::SocketAddr, sync::Arc};
//! use async_trait::async_trait;
//! use axum::Router;
//! use tollgate::{CredentialVerifier, Tollgate, TollgateError};
//! use tollgate_axum::{ProxyConfig, routes};
//!
//! struct Passwords;
//!
//! #[async_trait]
//! impl CredentialVerifier for Passwords {
//!     async fn verify(&self, email: &str, password: &str) -> Result<bool, TollgateError> {
//!         Ok(email == "user@example.com" && password == "hunter2")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let gate = Tollgate::builder().build().await.unwrap();
//!
//!     let auth_routes = routes(gate, Arc::new(Passwords))
//!         .with_proxy_config(ProxyConfig::behind_proxy());
//!
//!     let app = Router::new().nest("/auth", auth_routes.build());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(
//!         listener,
//!         app.into_make_service_with_connect_info::<SocketAddr>(),
//!     )
//!     .await
//!     .unwrap();
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{AuthError, Result};
pub use middleware::ip_gate;
pub use routes::{LockoutState, create_router};
pub use types::{
    ConnectionInfo, HealthResponse, LockStatusResponse, LoginRequest, LoginResponse, ProxyConfig,
};

use std::sync::Arc;

use axum::Router;
use tollgate::{CredentialVerifier, Tollgate};

/// Create lockout-protected authentication routes for your Axum application.
///
/// # Arguments
///
/// * `gate` - The Tollgate instance shared with the rest of your application
/// * `verifier` - Your credential check
///
/// # Returns
///
/// A builder whose router can be nested at any path (e.g., "/auth")
pub fn routes(gate: Tollgate, verifier: Arc<dyn CredentialVerifier>) -> LockoutRouterBuilder {
    LockoutRouterBuilder {
        gate,
        verifier,
        proxy_config: ProxyConfig::default(),
    }
}

/// Builder for configuring lockout routes
pub struct LockoutRouterBuilder {
    gate: Tollgate,
    verifier: Arc<dyn CredentialVerifier>,
    proxy_config: ProxyConfig,
}

impl LockoutRouterBuilder {
    /// Set how client addresses are determined
    pub fn with_proxy_config(mut self, config: ProxyConfig) -> Self {
        self.proxy_config = config;
        self
    }

    /// Build the router with the configured options
    pub fn build(self) -> Router {
        create_router(self.gate, self.verifier, self.proxy_config)
    }
}

impl From<LockoutRouterBuilder> for Router {
    fn from(builder: LockoutRouterBuilder) -> Self {
        builder.build()
    }
}
