use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::WithRejection;

use crate::api::{ApiError, AppState};
use crate::auth::{
    jwt_auth_middleware, rate_limit_middleware, AuthResponse, AuthService, AuthUser, ConfirmResetPasswordRequest,
    LoginRequest, MessageResponse, ProfileResponse, RegisterRequest, ResetPasswordRequest, TokenInfoResponse,
    UpdateProfileRequest,
};

/// Authentication routes
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let rate_limited = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let protected = Router::new()
        .route("/me", get(get_profile))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/verify-token", get(verify_token))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/reset-password", post(reset_password))
        .route("/reset-password-confirm", post(confirm_reset_password))
        .merge(rate_limited)
        .merge(protected)
}

/// Register a new user
#[tracing::instrument(skip(auth_service, request))]
async fn register(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login user
#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(auth_service), fields(user_id = %auth_user.id))]
async fn get_profile(
    State(auth_service): State<AuthService>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = auth_service.current_user(auth_user.id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        user: (&user).into(),
    }))
}

#[tracing::instrument(skip(auth_service, request), fields(user_id = %auth_user.id))]
async fn update_profile(
    State(auth_service): State<AuthService>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = auth_service.update_profile(auth_user.id, request).await?;
    Ok(Json(ProfileResponse { success: true, user }))
}

async fn verify_token(Extension(auth_user): Extension<AuthUser>) -> Json<TokenInfoResponse> {
    Json(TokenInfoResponse {
        success: true,
        valid: true,
        user: auth_user,
    })
}

/// Tokens are stateless; the client discards its copy
#[tracing::instrument(skip_all, fields(user_id = %auth_user.id))]
async fn logout(Extension(auth_user): Extension<AuthUser>) -> Json<MessageResponse> {
    tracing::info!("User {} logged out", auth_user.id);
    Json(MessageResponse::new("Logged out successfully"))
}

#[tracing::instrument(skip(auth_service, request))]
async fn reset_password(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): WithRejection<Json<ResetPasswordRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    let response = auth_service.request_password_reset(request).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(auth_service, request))]
async fn confirm_reset_password(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): WithRejection<Json<ConfirmResetPasswordRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    let response = auth_service.confirm_password_reset(request).await?;
    Ok(Json(response))
}
