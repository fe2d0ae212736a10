use serde::{Deserialize, Serialize};
use tollgate::{Keyspace, LockStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LockStatusResponse {
    pub keyspace: Keyspace,
    pub key: String,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<i64>,
}

impl LockStatusResponse {
    pub fn new(keyspace: Keyspace, key: impl Into<String>, status: LockStatus) -> Self {
        Self {
            keyspace,
            key: key.into(),
            locked: status.locked,
            retry_after_seconds: status.retry_after_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// How the client address is determined.
///
/// With `trust_forwarded_for` set, the right-most `X-Forwarded-For` entry is used: the
/// address the reverse proxy appended for its own peer. Only enable it when every request
/// passes through exactly one such proxy; otherwise any client can pick the address its
/// failures are counted against.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub trust_forwarded_for: bool,
}

impl ProxyConfig {
    pub fn behind_proxy() -> Self {
        Self {
            trust_forwarded_for: true,
        }
    }
}
