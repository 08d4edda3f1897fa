use axum::extract::FromRef;
use std::sync::Arc;

use crate::auth::{AuthService, JwtService, RateLimiter};
use crate::config::AppConfig;
use crate::services::{BookingService, ContentService, EmailService, Mailer};
use crate::storage::Store;

/// Shared handles for every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub auth_service: AuthService,
    pub booking_service: BookingService,
    pub content_service: ContentService,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_expires_in);
        let email_service = EmailService::new(mailer, config.frontend_url.clone());

        Self {
            auth_service: AuthService::new(store.clone(), jwt_service, email_service, config.bcrypt_cost),
            booking_service: BookingService::new(store.clone()),
            content_service: ContentService::new(store.clone()),
            rate_limiter: RateLimiter::from_config(&config.auth_rate_limit),
            config: Arc::new(config),
            store,
        }
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth_service.clone()
    }
}

impl FromRef<AppState> for BookingService {
    fn from_ref(state: &AppState) -> Self {
        state.booking_service.clone()
    }
}

impl FromRef<AppState> for ContentService {
    fn from_ref(state: &AppState) -> Self {
        state.content_service.clone()
    }
}

impl FromRef<AppState> for Store {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
