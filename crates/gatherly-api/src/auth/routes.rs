// Account lifecycle HTTP routes: register, login, token refresh, logout,
// email verification and password reset.

use axum::error_handling::HandleErrorLayer;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tower::{BoxError, ServiceBuilder};
use utoipa::ToSchema;
use validator::Validate;

use gatherly_core::{CurrentUser, Error};
use gatherly_storage::models::CreateUser;
use gatherly_storage::{password, Database};

use super::config::AuthConfig;
use super::extract::{AuthUser, AuthVerifier};
use super::jwt::{self, TokenKind};
use crate::common::MessageResponse;
use crate::error::ApiError;
use crate::mailer::Mailer;
use crate::services;
use crate::validate;
use std::sync::Arc;

/// App state for auth routes
#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub config: Arc<AuthConfig>,
    pub verifier: AuthVerifier,
    pub mailer: Mailer,
}

impl AuthState {
    pub fn new(db: Database, config: AuthConfig, mailer: Mailer) -> Self {
        let verifier = AuthVerifier::new(config.jwt.clone());
        Self {
            db,
            config: Arc::new(config),
            verifier,
            mailer,
        }
    }
}

impl FromRef<AuthState> for AuthVerifier {
    fn from_ref(state: &AuthState) -> Self {
        state.verifier.clone()
    }
}

/// Create auth routes. These carry a stricter request budget than the rest
/// of the API: credential stuffing and reset-token guessing hit them first.
pub fn routes(state: AuthState) -> Router {
    let per_minute = state.config.rate_limit_per_minute;
    let router = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .with_state(state);

    with_rate_limit(router, per_minute)
}

/// Cap the router to `per_minute` requests per minute, shedding the excess
/// with 429 instead of queueing it indefinitely
fn with_rate_limit(router: Router, per_minute: u64) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(rate_limit_exceeded))
            .load_shed()
            .buffer(per_minute.max(1) as usize)
            .rate_limit(per_minute.max(1), std::time::Duration::from_secs(60)),
    )
}

async fn rate_limit_exceeded(_: BoxError) -> ApiError {
    ApiError::new(
        StatusCode::TOO_MANY_REQUESTS,
        "Too many requests, please try again later",
    )
}

/// Opaque single-use token for email verification and password reset links
fn opaque_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(
        length(min = 3, max = 30, message = "must be between 3 and 30 characters"),
        custom = "crate::validate::username_charset"
    )]
    pub username: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub last_name: String,
    #[validate(custom = "crate::validate::password_strength")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub user: CurrentUser,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user: CurrentUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(custom = "crate::validate::password_strength")]
    pub password: String,
}

/// POST /api/auth/register - Create a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email or username already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate::check(&req)?;

    let email_token = opaque_token();
    let user = state
        .db
        .create_user(CreateUser {
            email: req.email.trim().to_lowercase(),
            username: req.username.trim().to_string(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            password_hash: password::hash_password(&req.password)?,
            email_token: email_token.clone(),
        })
        .await?;

    state.mailer.send_verification(&user.email, &email_token);
    tracing::info!(user_id = %user.id, "user registered");

    let counts = state.db.user_counts(user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User registered successfully. Please check your email to verify your account."
                .to_string(),
            user: services::user::current_user(user, counts),
        }),
    ))
}

/// POST /api/auth/login - Exchange credentials for a token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Same error for unknown email and wrong password
    let invalid = || Error::unauthorized("Invalid email or password");

    let user = state
        .db
        .get_user_by_email(&req.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash) {
        return Err(invalid().into());
    }

    let pair = jwt::issue_pair(&state.config.jwt, user.id)?;
    state
        .db
        .set_refresh_token(user.id, Some(&pair.refresh_token))
        .await?;

    tracing::info!(user_id = %user.id, "user logged in");

    let counts = state.db.user_counts(user.id).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: services::user::current_user(user, counts),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// POST /api/auth/refresh - Rotate the refresh token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 401, description = "Invalid or revoked refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AuthState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = jwt::verify(&state.config.jwt, &req.refresh_token, TokenKind::Refresh)?;

    // The presented token must also match the stored one; logout and password
    // reset revoke it even before it expires
    let user = state
        .db
        .get_user_by_refresh_token(claims.sub, &req.refresh_token)
        .await?
        .ok_or_else(|| Error::unauthorized("Invalid or expired token"))?;

    let pair = jwt::issue_pair(&state.config.jwt, user.id)?;
    state
        .db
        .set_refresh_token(user.id, Some(&pair.refresh_token))
        .await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// POST /api/auth/logout - Revoke the stored refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AuthState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.set_refresh_token(user_id, None).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// GET /api/auth/me - The authenticated user's own profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AuthState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CurrentUser>, ApiError> {
    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or(Error::NotFound("User"))?;
    let counts = state.db.user_counts(user_id).await?;

    Ok(Json(services::user::current_user(user, counts)))
}

/// POST /api/auth/verify-email - Consume an email verification token
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "auth"
)]
pub async fn verify_email(
    State(state): State<AuthState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = state
        .db
        .verify_email(&req.token)
        .await?
        .ok_or_else(|| Error::validation("Invalid or expired verification token"))?;

    tracing::info!(user_id = %user_id, "email verified");
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// POST /api/auth/forgot-password - Send a password reset link
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    State(state): State<AuthState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    // The response never reveals whether the email is registered
    if let Some(user) = state
        .db
        .get_user_by_email(&req.email.trim().to_lowercase())
        .await?
    {
        let token = opaque_token();
        state
            .db
            .set_reset_token(user.id, &token, Utc::now() + Duration::hours(1))
            .await?;
        state.mailer.send_password_reset(&user.email, &token);
        tracing::info!(user_id = %user.id, "password reset requested");
    }

    Ok(Json(MessageResponse::new(
        "If an account with that email exists, a password reset link has been sent",
    )))
}

/// POST /api/auth/reset-password - Consume a reset token and set a new password
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<AuthState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate::check(&req)?;

    let user_id = state
        .db
        .reset_password(&req.token, &password::hash_password(&req.password)?)
        .await?
        .ok_or_else(|| Error::validation("Invalid or expired reset token"))?;

    tracing::info!(user_id = %user_id, "password reset completed");
    Ok(Json(MessageResponse::new("Password reset successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_tokens_are_unique_hex() {
        let a = opaque_token();
        let b = opaque_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            email: "sarah@example.com".into(),
            username: "sarah_kim".into(),
            first_name: "Sarah".into(),
            last_name: "Kim".into(),
            password: "Password123".into(),
        }
    }

    #[test]
    fn register_request_accepts_valid_input() {
        assert!(validate::check(&register_request()).is_ok());
    }

    #[test]
    fn register_request_field_constraints() {
        let mut req = register_request();
        req.email = "not-an-email".into();
        assert!(validate::check(&req).is_err());

        let mut req = register_request();
        req.username = "sarah kim".into();
        assert!(validate::check(&req).is_err());

        let mut req = register_request();
        req.username = "ab".into();
        assert!(validate::check(&req).is_err());

        let mut req = register_request();
        req.first_name = "".into();
        assert!(validate::check(&req).is_err());

        let mut req = register_request();
        req.password = "password123".into();
        assert!(validate::check(&req).is_err());
    }

    #[test]
    fn reset_password_requires_a_strong_password() {
        let req = ResetPasswordRequest {
            token: "abc".into(),
            password: "weak".into(),
        };
        assert!(validate::check(&req).is_err());
    }

    #[tokio::test]
    async fn rate_limiter_sheds_excess_requests() {
        use axum::body::Body;
        use axum::http::Request;
        use axum::routing::get;
        use tower::ServiceExt;

        fn ping() -> Request<Body> {
            Request::builder().uri("/ping").body(Body::empty()).unwrap()
        }

        let app = with_rate_limit(
            Router::new().route("/ping", get(|| async { "ok" })),
            1,
        );

        // Within budget
        let resp = app.clone().oneshot(ping()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // Budget spent: one request may queue for the next window...
        let queued = tokio::spawn({
            let app = app.clone();
            async move { app.oneshot(ping()).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // ...and anything beyond that is shed immediately
        let resp = app.oneshot(ping()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        queued.abort();
    }
}
