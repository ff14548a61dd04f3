//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: strict limits for `/api/auth/*` (~10/min)
//! - `generation_rate_limiter`: limits for routes that call a language model
//!   (~20/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client IP from proxy headers, falling back to the socket peer.
///
/// Header order: `Fly-Client-IP`, first `X-Forwarded-For` entry, `X-Real-IP`.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        ["fly-client-ip", "x-forwarded-for", "x-real-ip"]
            .into_iter()
            .find_map(|name| header_ip(req, name))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// 1 token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Does not panic: `per_second(6)` and `burst_size(5)` are valid.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rate limiter for generation endpoints: ~20 requests per minute per IP.
///
/// 1 token every 3 seconds, burst of 10.
///
/// # Panics
///
/// Does not panic: `per_second(3)` and `burst_size(10)` are valid.
#[must_use]
pub fn generation_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(3)
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_second(3) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_prefers_fly_header() {
        let req = Request::builder()
            .header("x-forwarded-for", "10.0.0.2, 10.0.0.3")
            .header("fly-client-ip", "203.0.113.9")
            .body(())
            .unwrap();
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_uses_first_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "10.0.0.2, 10.0.0.3")
            .body(())
            .unwrap();
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "10.0.0.2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("127.0.0.1:4000".parse::<SocketAddr>().unwrap()));
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "127.0.0.1".parse::<IpAddr>().unwrap());

        let bare = Request::builder().body(()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&bare).is_err());
    }
}
