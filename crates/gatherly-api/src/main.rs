// Gatherly API server
// Events and social RSVP backend: accounts, event discovery, attendance,
// likes, reviews and follows.

mod auth;
mod common;
mod error;
mod events;
mod mailer;
mod services;
mod users;
mod validate;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use gatherly_storage::Database;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::register,
        auth::routes::login,
        auth::routes::refresh,
        auth::routes::logout,
        auth::routes::me,
        auth::routes::verify_email,
        auth::routes::forgot_password,
        auth::routes::reset_password,
        events::list_events,
        events::trending_events,
        events::get_event,
        events::create_event,
        events::rsvp,
        events::like,
        events::create_review,
        users::get_profile,
        users::update_profile,
        users::hosted_events,
        users::follow,
    ),
    components(
        schemas(
            gatherly_core::Event,
            gatherly_core::EventDetail,
            gatherly_core::EventHost,
            gatherly_core::EventCategory,
            gatherly_core::RsvpStatus,
            gatherly_core::Rsvp,
            gatherly_core::AttendanceUpdate,
            gatherly_core::Review,
            gatherly_core::ReviewAuthor,
            gatherly_core::CurrentUser,
            gatherly_core::PublicProfile,
            gatherly_core::UserCounts,
            common::Pagination,
            common::EventsPage,
            common::MessageResponse,
            auth::routes::RegisterRequest,
            auth::routes::UserResponse,
            auth::routes::LoginRequest,
            auth::routes::LoginResponse,
            auth::routes::RefreshRequest,
            auth::routes::TokenResponse,
            auth::routes::VerifyEmailRequest,
            auth::routes::ForgotPasswordRequest,
            auth::routes::ResetPasswordRequest,
            events::EventsQuery,
            events::EventList,
            events::CreateEventRequest,
            events::CreateEventResponse,
            events::RsvpRequest,
            events::RsvpResponse,
            events::LikeResponse,
            events::CreateReviewRequest,
            events::CreateReviewResponse,
            users::UpdateProfileRequest,
            users::ProfileResponse,
            users::FollowResponse,
        )
    ),
    tags(
        (name = "auth", description = "Account lifecycle and tokens"),
        (name = "events", description = "Event discovery, attendance, likes and reviews"),
        (name = "users", description = "Profiles and follows")
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Gatherly API",
        version = "0.2.0",
        description = "Events and social RSVP backend",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatherly_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("gatherly-api starting...");

    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Database::from_url(&database_url)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Connected to database, migrations applied");

    // Load authentication configuration and the shared token verifier
    let auth_config = auth::AuthConfig::from_env();
    let verifier = auth::AuthVerifier::new(auth_config.jwt.clone());

    // Outbound email (gracefully degrades without SMTP configuration)
    let mailer = mailer::Mailer::from_env(&auth_config.frontend_url)
        .context("Failed to configure mailer")?;

    // Create module-specific states
    let auth_state = auth::AuthState::new(db.clone(), auth_config, mailer);
    let events_state = events::AppState {
        db: db.clone(),
        verifier: verifier.clone(),
    };
    let users_state = users::AppState {
        db: db.clone(),
        verifier,
    };

    // Load CORS allowed origins from environment (optional)
    // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let api_routes = Router::new()
        .merge(auth::routes(auth_state))
        .merge(events::routes(events_state))
        .merge(users::routes(users_state));

    let app = build_app(api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Health endpoint plus all API routes under the /api prefix (extracted for
/// testing)
fn build_app(api_routes: Router) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/events", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_app(test_routes());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_api_routes_are_prefixed() {
        let app = build_app(test_routes());

        // Route works under the prefix
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        // ...and not without it
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}
