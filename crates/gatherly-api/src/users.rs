// User HTTP routes: public profiles, own-profile updates, hosted events,
// and follow toggling.

use axum::extract::{FromRef, Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use gatherly_core::{CurrentUser, Error, PublicProfile};
use gatherly_storage::models::UpdateProfile;
use gatherly_storage::Database;

use crate::auth::{AuthUser, AuthVerifier, OptionalAuthUser};
use crate::error::ApiError;
use crate::events::EventList;
use crate::services;
use crate::validate;

/// App state for user routes
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub verifier: AuthVerifier,
}

impl FromRef<AppState> for AuthVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

/// Create user routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/users/profile", put(update_profile))
        .route("/users/:user_id", get(get_profile))
        .route("/users/:user_id/events", get(hosted_events))
        .route("/users/:user_id/follow", post(follow))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub website: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub message: String,
    pub user: CurrentUser,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub message: String,
    pub is_following: bool,
}

/// GET /api/users/{user_id} - Public profile with aggregate counts
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Profile found", body = PublicProfile),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PublicProfile>, ApiError> {
    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or(Error::NotFound("User"))?;
    let counts = state.db.user_counts(user_id).await?;

    Ok(Json(services::user::public_profile(user, counts)))
}

/// PUT /api/users/profile - Update the caller's own profile
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    validate::check(&req)?;

    let user = state
        .db
        .update_profile(
            user_id,
            UpdateProfile {
                first_name: req.first_name,
                last_name: req.last_name,
                avatar: req.avatar,
                bio: req.bio,
                phone: req.phone,
                location: req.location,
                website: req.website,
            },
        )
        .await?
        .ok_or(Error::NotFound("User"))?;
    let counts = state.db.user_counts(user_id).await?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: services::user::current_user(user, counts),
    }))
}

/// GET /api/users/{user_id}/events - Public events hosted by a user
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/events",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Hosted events", body = EventList),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn hosted_events(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<EventList>, ApiError> {
    if state.db.get_user(user_id).await?.is_none() {
        return Err(Error::NotFound("User").into());
    }

    let rows = state.db.list_events_by_host(user_id, viewer).await?;

    Ok(Json(EventList {
        events: rows.into_iter().map(services::event::listing_event).collect(),
    }))
}

/// POST /api/users/{user_id}/follow - Toggle following a user
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/follow",
    params(
        ("user_id" = Uuid, Path, description = "User to follow or unfollow")
    ),
    responses(
        (status = 200, description = "Follow toggled", body = FollowResponse),
        (status = 400, description = "Cannot follow yourself"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn follow(
    State(state): State<AppState>,
    AuthUser(follower_id): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<FollowResponse>, ApiError> {
    if follower_id == user_id {
        return Err(Error::validation("You cannot follow yourself").into());
    }
    if state.db.get_user(user_id).await?.is_none() {
        return Err(Error::NotFound("User").into());
    }

    let is_following = state.db.toggle_follow(follower_id, user_id).await?;

    Ok(Json(FollowResponse {
        message: if is_following {
            "User followed".to_string()
        } else {
            "User unfollowed".to_string()
        },
        is_following,
    }))
}
