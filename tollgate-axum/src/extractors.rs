use std::net::SocketAddr;

use axum::{
    RequestPartsExt,
    extract::{ConnectInfo, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use axum_extra::{TypedHeader, headers::UserAgent};

use crate::types::{ConnectionInfo, ProxyConfig};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

impl<S> FromRequestParts<S> for ConnectionInfo
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .extract::<Option<TypedHeader<UserAgent>>>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid user agent header"))?
            .map(|ua| ua.to_string());

        let proxy = parts
            .extensions
            .get::<ProxyConfig>()
            .cloned()
            .unwrap_or_default();

        let forwarded = if proxy.trust_forwarded_for {
            forwarded_for(parts)
        } else {
            None
        };

        let ip = match forwarded {
            Some(ip) => Some(ip),
            None => parts
                .extract::<ConnectInfo<SocketAddr>>()
                .await
                .ok()
                .map(|addr| addr.ip().to_string()),
        };

        Ok(ConnectionInfo { ip, user_agent })
    }
}

/// The client as seen by the trusted proxy: the right-most `X-Forwarded-For` entry.
///
/// Entries to its left are supplied by the client and cannot be trusted.
fn forwarded_for(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> ConnectionInfo {
        let (mut parts, _) = request.into_parts();
        ConnectionInfo::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_forwarded_for_ignored_by_default() {
        let request = Request::builder()
            .header(X_FORWARDED_FOR, "203.0.113.7")
            .body(())
            .unwrap();

        assert_eq!(extract(request).await.ip, None);
    }

    #[tokio::test]
    async fn test_forwarded_for_when_trusted() {
        let mut request = Request::builder()
            .header(X_FORWARDED_FOR, " 203.0.113.7 ")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap();
        request.extensions_mut().insert(ProxyConfig::behind_proxy());

        let info = extract(request).await;
        assert_eq!(info.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[tokio::test]
    async fn test_forwarded_for_ignores_client_supplied_entries() {
        // The client sent "198.51.100.99", the proxy appended the real peer address
        let mut request = Request::builder()
            .header(X_FORWARDED_FOR, "198.51.100.99, 203.0.113.7")
            .body(())
            .unwrap();
        request.extensions_mut().insert(ProxyConfig::behind_proxy());

        assert_eq!(extract(request).await.ip.as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_connect_info_fallback() {
        let mut request = Request::builder().body(()).unwrap();
        request.extensions_mut().insert(ProxyConfig::behind_proxy());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 4242))));

        assert_eq!(extract(request).await.ip.as_deref(), Some("192.0.2.10"));
    }
}
