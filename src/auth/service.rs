use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::password::{generate_reset_token, hash_password, validate_password_strength, verify_password};
use crate::auth::{
    AuthError, AuthResponse, AuthUser, ConfirmResetPasswordRequest, JwtService, LoginRequest, MessageResponse,
    PasswordPolicy, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use crate::models::{normalize_email, validate_email, validate_name, validate_phone, User, UserResponse, UserRole};
use crate::services::EmailService;
use crate::storage::{Store, StoreError, UserUpdate};

const RESET_TOKEN_TTL_HOURS: i64 = 1;
const RESET_REQUESTED_MESSAGE: &str = "If an account with that email exists, password reset instructions have been sent";

#[derive(Clone)]
pub struct AuthService {
    store: Store,
    jwt_service: JwtService,
    email_service: EmailService,
    password_policy: PasswordPolicy,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Store, jwt_service: JwtService, email_service: EmailService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt_service,
            email_service,
            password_policy: PasswordPolicy::default(),
            bcrypt_cost,
        }
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let name = request.name.trim().to_string();
        validate_name(&name).map_err(validation)?;
        validate_email(&request.email).map_err(validation)?;
        validate_password_strength(&request.password, &self.password_policy)?;
        let phone = normalize_phone(request.phone)?;

        let email = normalize_email(&request.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = self.hash(request.password).await?;

        // the store re-checks uniqueness atomically
        let user = self
            .store
            .insert_user(User::new(name, email, phone, password_hash))
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => AuthError::EmailAlreadyExists,
                other => AuthError::Storage(other),
            })?;

        let token = self.jwt_service.create_token(&user)?;
        tracing::info!("Registered user {}", user.id);

        if let Err(e) = self.email_service.send_welcome(&user).await {
            tracing::warn!("Welcome email to user {} failed: {}", user.id, e);
        }

        Ok(AuthResponse {
            success: true,
            message: "Registration successful".to_string(),
            token,
            user: UserResponse::from(&user),
        })
    }

    /// Login user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        validate_email(&request.email).map_err(validation)?;
        if request.password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        let user = self
            .store
            .find_user_by_email(&normalize_email(&request.email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified_hash = user.password_hash.clone();
        if !self.verify(request.password, verified_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        // deactivation or a password change since the check above wins
        let now = Utc::now();
        let outcome = self
            .store
            .modify_user(user.id, move |u| {
                if !u.is_active || u.password_hash != verified_hash {
                    return false;
                }
                u.last_login = Some(now);
                u.updated_at = now;
                true
            })
            .await?;

        let user = match outcome {
            UserUpdate::Applied(user) => user,
            UserUpdate::Rejected(user) if !user.is_active => return Err(AuthError::AccountDisabled),
            UserUpdate::Rejected(_) | UserUpdate::NotFound => return Err(AuthError::InvalidCredentials),
        };

        let token = self.jwt_service.create_token(&user)?;
        tracing::info!("User {} logged in", user.id);

        Ok(AuthResponse {
            success: true,
            message: "Login successful".to_string(),
            token,
            user: UserResponse::from(&user),
        })
    }

    /// Verify a bearer token and return the identity it carries
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.jwt_service.authenticate(token)
    }

    /// The stored record behind a verified identity
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }

    pub async fn require_admin(&self, auth_user: &AuthUser) -> Result<User, AuthError> {
        let user = self.current_user(auth_user.id).await?;
        if user.role != UserRole::Admin {
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(user)
    }

    pub async fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> Result<UserResponse, AuthError> {
        let name = match request.name {
            Some(name) => {
                let name = name.trim().to_string();
                validate_name(&name).map_err(validation)?;
                Some(name)
            }
            None => None,
        };
        let phone = match request.phone {
            Some(phone) => Some(normalize_phone(Some(phone))?),
            None => None,
        };

        let now = Utc::now();
        let outcome = self
            .store
            .modify_user(user_id, move |u| {
                if !u.is_active {
                    return false;
                }
                if let Some(name) = name {
                    u.name = name;
                }
                if let Some(phone) = phone {
                    u.phone = phone;
                }
                u.updated_at = now;
                true
            })
            .await?;

        let user = match outcome {
            UserUpdate::Applied(user) => user,
            UserUpdate::Rejected(_) => return Err(AuthError::AccountDisabled),
            UserUpdate::NotFound => return Err(AuthError::UserNotFound),
        };
        tracing::info!("Updated profile of user {}", user.id);

        Ok(UserResponse::from(&user))
    }

    pub async fn request_password_reset(&self, request: ResetPasswordRequest) -> Result<MessageResponse, AuthError> {
        self.request_password_reset_at(request, Utc::now()).await
    }

    /// Issue a one-hour reset token. Unknown emails get the same response.
    pub async fn request_password_reset_at(
        &self,
        request: ResetPasswordRequest,
        now: DateTime<Utc>,
    ) -> Result<MessageResponse, AuthError> {
        validate_email(&request.email).map_err(validation)?;

        let Some(found) = self.store.find_user_by_email(&normalize_email(&request.email)).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE));
        };

        let token = generate_reset_token();
        let stored_token = token.clone();
        let outcome = self
            .store
            .modify_user(found.id, move |u| {
                u.reset_token = Some(stored_token);
                u.reset_token_expires_at = Some(now + Duration::hours(RESET_TOKEN_TTL_HOURS));
                u.updated_at = now;
                true
            })
            .await?;

        let UserUpdate::Applied(user) = outcome else {
            tracing::info!("Password reset requested for a user removed meanwhile");
            return Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE));
        };

        if let Err(e) = self.email_service.send_password_reset(&user, &token).await {
            tracing::warn!("Password reset email to user {} failed: {}", user.id, e);
        }

        tracing::info!("Issued password reset token for user {}", user.id);
        Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
    }

    pub async fn confirm_password_reset(
        &self,
        request: ConfirmResetPasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        self.confirm_password_reset_at(request, Utc::now()).await
    }

    pub async fn confirm_password_reset_at(
        &self,
        request: ConfirmResetPasswordRequest,
        now: DateTime<Utc>,
    ) -> Result<MessageResponse, AuthError> {
        if request.token.trim().is_empty() {
            return Err(AuthError::InvalidResetToken);
        }
        validate_password_strength(&request.new_password, &self.password_policy)?;

        let user = self
            .store
            .find_user_by_reset_token(&request.token)
            .await?
            .filter(|user| user.reset_token_matches(&request.token, now))
            .ok_or(AuthError::InvalidResetToken)?;

        let password_hash = self.hash(request.new_password).await?;

        // the token is re-checked under the store's lock, so it is consumed once
        let token = request.token;
        let outcome = self
            .store
            .modify_user(user.id, move |u| {
                if !u.reset_token_matches(&token, now) {
                    return false;
                }
                u.password_hash = password_hash;
                u.reset_token = None;
                u.reset_token_expires_at = None;
                u.updated_at = now;
                true
            })
            .await?;

        let UserUpdate::Applied(user) = outcome else {
            return Err(AuthError::InvalidResetToken);
        };

        tracing::info!("Password reset completed for user {}", user.id);
        Ok(MessageResponse::new("Password has been reset successfully"))
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AuthError> {
        let users = self.store.list_users().await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    /// Activate or deactivate an account
    pub async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> Result<UserResponse, AuthError> {
        let now = Utc::now();
        let outcome = self
            .store
            .modify_user(user_id, move |u| {
                u.is_active = is_active;
                u.updated_at = now;
                true
            })
            .await?;

        let (UserUpdate::Applied(user) | UserUpdate::Rejected(user)) = outcome else {
            return Err(AuthError::UserNotFound);
        };

        tracing::info!("User {} active flag set to {}", user.id, is_active);
        Ok(UserResponse::from(&user))
    }

    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::Internal(e.into()))??;
        Ok(hashed)
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.into()))??;
        Ok(matches)
    }
}

fn validation(err: anyhow::Error) -> AuthError {
    AuthError::Validation(err.to_string())
}

/// Blank phone numbers clear the field; others must be valid
fn normalize_phone(phone: Option<String>) -> Result<Option<String>, AuthError> {
    match phone.map(|p| p.trim().to_string()) {
        Some(p) if p.is_empty() => Ok(None),
        Some(p) => {
            validate_phone(&p).map_err(validation)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}
