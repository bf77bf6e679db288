// Event HTTP routes: discovery listing, trending, detail, creation, RSVPs,
// likes and reviews.

use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use gatherly_core::{AttendanceUpdate, Error, Event, EventCategory, EventDetail, Review, RsvpStatus};
use gatherly_storage::models::{CreateEvent, CreateReview, EventFilter};
use gatherly_storage::Database;

use crate::auth::{AuthUser, AuthVerifier, OptionalAuthUser};
use crate::common::{EventsPage, Pagination};
use crate::error::ApiError;
use crate::services;
use crate::validate;

/// Reviews embedded in the detail view are capped
const DETAIL_REVIEW_LIMIT: i64 = 5;

/// App state for event routes
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

/// Create event routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/trending", get(trending_events))
        .route("/events/:event_id", get(get_event))
        .route("/events/:event_id/rsvp", post(rsvp))
        .route("/events/:event_id/like", post(like))
        .route("/events/:event_id/reviews", post(create_review))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 50, message = "must be between 1 and 50"))]
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// Category name, or "all" for no filter
    pub category: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub featured: Option<bool>,
}

impl EventsQuery {
    fn filter(&self) -> Result<EventFilter, Error> {
        let category = match self.category.as_deref() {
            None | Some("all") => None,
            Some(name) => Some(name.parse::<EventCategory>()?),
        };

        Ok(EventFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            category,
            location: self.location.clone().filter(|s| !s.trim().is_empty()),
            start_date_from: self.start_date,
            start_date_to: self.end_date,
            price_min: self.price_min,
            price_max: self.price_max,
            featured: self.featured,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventList {
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 3, max = 100, message = "must be between 3 and 100 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 2000, message = "must be between 10 and 2000 characters"))]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub location: String,
    pub address: Option<String>,
    pub category: String,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_attendees: Option<i32>,
    #[validate(range(min = 0.0, message = "must be zero or more"))]
    pub price: Option<f64>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Defaults to public
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateEventResponse {
    pub message: String,
    pub event: Event,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RsvpRequest {
    /// GOING, MAYBE or NOT_GOING
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RsvpResponse {
    pub message: String,
    #[serde(flatten)]
    pub update: AttendanceUpdate,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: String,
    pub is_liked: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, max = 1000, message = "must be between 1 and 1000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateReviewResponse {
    pub message: String,
    pub review: Review,
}

/// GET /api/events - Paged discovery listing with filters
#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "Paged events", body = EventsPage),
        (status = 400, description = "Invalid filter")
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsPage>, ApiError> {
    validate::check(&query)?;
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(validate::DEFAULT_PAGE_SIZE);
    let offset = validate::offset(page, limit)?;
    let filter = query.filter()?;

    let rows = state
        .db
        .list_events(&filter, viewer, limit, offset)
        .await?;
    let total = state.db.count_events(&filter).await?;

    Ok(Json(EventsPage {
        events: rows.into_iter().map(services::event::listing_event).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/events/trending - Upcoming events by popularity
#[utoipa::path(
    get,
    path = "/api/events/trending",
    responses(
        (status = 200, description = "Trending events", body = EventList)
    ),
    tag = "events"
)]
pub async fn trending_events(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
) -> Result<Json<EventList>, ApiError> {
    let rows = state.db.trending_events(viewer).await?;

    Ok(Json(EventList {
        events: rows.into_iter().map(services::event::listing_event).collect(),
    }))
}

/// GET /api/events/{event_id} - Event detail with recent reviews
#[utoipa::path(
    get,
    path = "/api/events/{event_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = EventDetail),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetail>, ApiError> {
    let row = state
        .db
        .get_event_with_host(event_id, viewer)
        .await?
        .ok_or(Error::NotFound("Event"))?;

    // A private event is indistinguishable from a missing one for everyone
    // but its host
    if !row.is_public && viewer != Some(row.host_id) {
        return Err(Error::NotFound("Event").into());
    }

    let reviews = state
        .db
        .list_recent_reviews(event_id, DETAIL_REVIEW_LIMIT)
        .await?;
    let review_count = state.db.count_reviews(event_id).await?;

    Ok(Json(services::event::detail_event(row, review_count, reviews)))
}

/// POST /api/events - Create an event hosted by the authenticated user
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = CreateEventResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CreateEventResponse>), ApiError> {
    validate::check(&req)?;

    if req.price.is_some_and(|p| !p.is_finite()) {
        return Err(Error::validation("price: must be a finite number").into());
    }
    if req.start_date <= Utc::now() {
        return Err(Error::validation("startDate must be in the future").into());
    }
    if let Some(end) = req.end_date {
        if end <= req.start_date {
            return Err(Error::validation("endDate must be after startDate").into());
        }
    }

    let category = req.category.parse::<EventCategory>()?;

    let created = state
        .db
        .create_event(CreateEvent {
            host_id: user_id,
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            start_date: req.start_date,
            end_date: req.end_date,
            location: req.location.trim().to_string(),
            address: req.address,
            category,
            max_attendees: req.max_attendees,
            price: req.price,
            cover_image: req.cover_image,
            tags: req.tags,
            is_public: req.is_public.unwrap_or(true),
        })
        .await?;

    tracing::info!(event_id = %created.id, host_id = %user_id, "event created");

    // Re-read through the host join so the response matches the listing shape
    let row = state
        .db
        .get_event_with_host(created.id, Some(user_id))
        .await?
        .ok_or(Error::NotFound("Event"))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            message: "Event created successfully".to_string(),
            event: services::event::listing_event(row),
        }),
    ))
}

/// POST /api/events/{event_id}/rsvp - Set the caller's attendance
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/rsvp",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    request_body = RsvpRequest,
    responses(
        (status = 200, description = "Attendance updated", body = RsvpResponse),
        (status = 400, description = "Invalid status or event at capacity"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer" = [])),
    tag = "events"
)]
pub async fn rsvp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<RsvpRequest>,
) -> Result<Json<RsvpResponse>, ApiError> {
    let status = req.status.parse::<RsvpStatus>()?;
    let change = state.db.set_attendance(event_id, user_id, status).await?;

    Ok(Json(RsvpResponse {
        message: "RSVP updated successfully".to_string(),
        update: services::event::attendance_update(change),
    }))
}

/// POST /api/events/{event_id}/like - Toggle the caller's like
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/like",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer" = [])),
    tag = "events"
)]
pub async fn like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    let is_liked = state.db.toggle_like(event_id, user_id).await?;

    Ok(Json(LikeResponse {
        message: if is_liked {
            "Event liked".to_string()
        } else {
            "Event unliked".to_string()
        },
        is_liked,
    }))
}

/// POST /api/events/{event_id}/reviews - Review an event (once per user)
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/reviews",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = CreateReviewResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer" = [])),
    tag = "events"
)]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<CreateReviewResponse>), ApiError> {
    validate::check(&req)?;

    if state.db.get_event(event_id).await?.is_none() {
        return Err(Error::NotFound("Event").into());
    }

    let row = state
        .db
        .create_review(CreateReview {
            user_id,
            event_id,
            rating: req.rating,
            comment: req.comment,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateReviewResponse {
            message: "Review submitted successfully".to_string(),
            review: services::event::review(row),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_all_means_no_filter() {
        let query = EventsQuery {
            category: Some("all".into()),
            ..Default::default()
        };
        assert!(query.filter().unwrap().category.is_none());
    }

    #[test]
    fn category_names_parse_case_insensitively() {
        let query = EventsQuery {
            category: Some("music".into()),
            ..Default::default()
        };
        assert_eq!(
            query.filter().unwrap().category,
            Some(EventCategory::Music)
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let query = EventsQuery {
            category: Some("knitting".into()),
            ..Default::default()
        };
        assert!(query.filter().is_err());
    }

    #[test]
    fn pagination_bounds_are_validated() {
        let query = EventsQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(validate::check(&query).is_err());

        let query = EventsQuery {
            limit: Some(51),
            ..Default::default()
        };
        assert!(validate::check(&query).is_err());

        let query = EventsQuery {
            page: Some(3),
            limit: Some(50),
            ..Default::default()
        };
        assert!(validate::check(&query).is_ok());
    }

    #[test]
    fn huge_page_numbers_fail_instead_of_wrapping() {
        // A page of i64::MAX is within the range constraint, so the offset
        // computation itself must reject it rather than overflow
        let query = EventsQuery {
            page: Some(i64::MAX),
            ..Default::default()
        };
        assert!(validate::check(&query).is_ok());
        assert!(validate::offset(i64::MAX, validate::DEFAULT_PAGE_SIZE).is_err());
    }

    #[test]
    fn create_event_field_limits() {
        let req = CreateEventRequest {
            title: "ab".into(),
            description: "too short".into(),
            start_date: Utc::now(),
            end_date: None,
            location: "x".into(),
            address: None,
            category: "TECHNOLOGY".into(),
            max_attendees: Some(0),
            price: Some(-1.0),
            cover_image: None,
            tags: vec![],
            is_public: None,
        };
        let msg = validate::check(&req).unwrap_err().to_string();
        assert!(msg.contains("title:"), "{msg}");
        assert!(msg.contains("description:"), "{msg}");
        assert!(msg.contains("location:"), "{msg}");
        assert!(msg.contains("maxAttendees:") || msg.contains("max_attendees:"), "{msg}");
        assert!(msg.contains("price:"), "{msg}");
    }

    #[test]
    fn review_rating_range() {
        let req = CreateReviewRequest {
            rating: 6,
            comment: None,
        };
        assert!(validate::check(&req).is_err());

        let req = CreateReviewRequest {
            rating: 5,
            comment: Some("Great event".into()),
        };
        assert!(validate::check(&req).is_ok());
    }

    #[test]
    fn blank_search_terms_are_dropped() {
        let query = EventsQuery {
            search: Some("   ".into()),
            location: Some("".into()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert!(filter.search.is_none());
        assert!(filter.location.is_none());
    }
}
