use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tollgate::{Keyspace, Tollgate};

use crate::{error::AuthError, types::ConnectionInfo};

/// Refuse requests from client addresses that are locked out.
///
/// Requests whose address cannot be determined pass through.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/password/reset", post(reset_handler))
///     .layer(axum::middleware::from_fn_with_state(gate.clone(), ip_gate));
/// ```
pub async fn ip_gate(
    State(gate): State<Tollgate>,
    connection_info: ConnectionInfo,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Some(ip) = connection_info.ip.as_deref() {
        let status = gate.tracker().is_ip_locked(ip);
        if status.locked {
            tracing::debug!(ip_address = %ip, path = %request.uri().path(), "Rejected request from locked address");
            return Err(AuthError::TooManyAttempts {
                scope: Keyspace::Ip,
                retry_after_seconds: status.retry_after_seconds().unwrap_or_default(),
            });
        }
    }

    Ok(next.run(request).await)
}
