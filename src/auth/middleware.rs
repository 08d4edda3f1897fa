use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{extract_bearer_token, AuthError, AuthService, AuthUser, RateLimitConfig};

/// JWT authentication middleware
pub async fn jwt_auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = extract_bearer_token(auth_header)?;
    let auth_user = auth_service.authenticate(token)?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Admin-only middleware; must run after `jwt_auth_middleware`
pub async fn admin_only_middleware(
    State(auth_service): State<AuthService>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuthHeader)?;

    auth_service.require_admin(auth_user).await?;

    Ok(next.run(request).await)
}

/// CORS for the browser UI. Development allows any origin.
pub fn cors_layer(frontend_url: &str, allow_any_origin: bool) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, axum::http::header::CONTENT_TYPE]);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) if !allow_any_origin => layer.allow_origin(origin).allow_credentials(true),
        _ => layer.allow_origin(Any),
    }
}

/// Security headers middleware
pub fn security_headers_layer() -> tower_http::set_header::SetResponseHeaderLayer<HeaderValue> {
    tower_http::set_header::SetResponseHeaderLayer::overriding(
        axum::http::header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    )
}

/// Sliding-window request counter keyed by client address
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
            trust_proxy_headers: false,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            trust_proxy_headers: config.trust_proxy_headers,
            ..Self::new(config.max_requests as usize, Duration::from_secs(config.window_seconds))
        }
    }

    /// Number of clients with requests still inside the window
    pub fn tracked_clients(&self) -> usize {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        self.check_rate_limit_at(key, Instant::now())
    }

    pub fn check_rate_limit_at(&self, key: &str, now: Instant) -> bool {
        let mut requests = self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // Drop expired requests, and clients left with none
        requests.retain(|_, times| {
            times.retain(|&time| now.saturating_duration_since(time) < self.window);
            !times.is_empty()
        });

        let entry = requests.entry(key.to_string()).or_default();
        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }
}

/// Rejects clients that exceeded the limiter's budget with 429
pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let client_ip = client_key(&request, rate_limiter.trust_proxy_headers);

    if !rate_limiter.check_rate_limit(&client_ip) {
        tracing::warn!("Rate limit exceeded for {}", client_ip);
        return Err(AuthError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Peer address, or the first forwarded address when proxy headers are trusted
fn client_key(request: &Request, trust_proxy_headers: bool) -> String {
    let forwarded = trust_proxy_headers
        .then(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .or_else(|| request.headers().get("x-real-ip"))
        })
        .flatten()
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
