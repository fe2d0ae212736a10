use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use tollgate::{CredentialVerifier, Keyspace, Tollgate, normalize_account};

use crate::{
    error::{AuthError, Result},
    types::*,
};

/// Shared state of the lockout routes.
#[derive(Clone)]
pub struct LockoutState {
    pub gate: Tollgate,
    pub verifier: Arc<dyn CredentialVerifier>,
}

pub fn create_router(
    gate: Tollgate,
    verifier: Arc<dyn CredentialVerifier>,
    proxy_config: ProxyConfig,
) -> Router {
    let state = LockoutState { gate, verifier };

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .route("/lockout/account/{email}", get(account_status_handler))
        .route("/lockout/ip/{ip}", get(ip_status_handler))
        .with_state(state)
        .layer(axum::Extension(proxy_config))
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn login_handler(
    State(state): State<LockoutState>,
    connection_info: ConnectionInfo,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    if payload.password.is_empty() {
        return Err(AuthError::BadRequest("Password is required".to_string()));
    }

    state
        .gate
        .authenticate(
            state.verifier.as_ref(),
            &payload.email,
            &payload.password,
            connection_info.ip.as_deref(),
        )
        .await?;

    Ok(Json(LoginResponse {
        email: normalize_account(&payload.email),
        message: "Login successful".to_string(),
    }))
}

async fn account_status_handler(
    State(state): State<LockoutState>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    let status = state.gate.tracker().is_account_locked(&email);
    Json(LockStatusResponse::new(
        Keyspace::Account,
        normalize_account(&email),
        status,
    ))
}

async fn ip_status_handler(
    State(state): State<LockoutState>,
    Path(ip): Path<String>,
) -> impl IntoResponse {
    let status = state.gate.tracker().is_ip_locked(&ip);
    Json(LockStatusResponse::new(Keyspace::Ip, ip, status))
}
