// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use gatherly_core::EventCategory;
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// User models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub verified: bool,
    pub email_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_expires: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub email_token: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// Aggregate counts for one user, computed on read
#[derive(Debug, Clone, FromRow)]
pub struct UserCountsRow {
    pub hosted_events: i64,
    pub attending: i64,
    pub followers: i64,
    pub following: i64,
}

// ============================================
// Event models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub address: Option<String>,
    pub category: String,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub price: Option<f64>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub featured: bool,
    pub is_public: bool,
    pub canceled: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event joined with its host and viewer-dependent aggregates.
/// Column aliases must match the SELECT list in `repositories.rs`.
#[derive(Debug, Clone, FromRow)]
pub struct EventWithHostRow {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub address: Option<String>,
    pub category: String,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub price: Option<f64>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub featured: bool,
    pub is_public: bool,
    pub canceled: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub host_username: String,
    pub host_first_name: String,
    pub host_last_name: String,
    pub host_avatar: Option<String>,
    pub host_verified: bool,
    pub host_bio: Option<String>,
    pub attendee_count: i64,
    pub like_count: i64,
    pub is_liked: bool,
    pub user_rsvp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub host_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub address: Option<String>,
    pub category: EventCategory,
    pub max_attendees: Option<i32>,
    pub price: Option<f64>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
}

/// Filters for the event listing. All fields are conjunctive; listing is
/// always restricted to public, non-canceled, published, future-dated events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Case-insensitive substring on title/description, or exact tag match
    pub search: Option<String>,
    pub category: Option<EventCategory>,
    /// Case-insensitive substring on location
    pub location: Option<String>,
    pub start_date_from: Option<DateTime<Utc>>,
    pub start_date_to: Option<DateTime<Utc>>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub featured: Option<bool>,
}

// ============================================
// RSVP / review models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct RsvpRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateReview {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewWithAuthorRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_avatar: Option<String>,
}
