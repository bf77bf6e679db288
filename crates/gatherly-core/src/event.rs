// Event domain types: categories, RSVP statuses, and the public DTOs
// returned by the events API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;

/// Event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Technology,
    Business,
    Design,
    Social,
    Networking,
    Education,
    Health,
    Sports,
    Music,
    Art,
    Food,
    Travel,
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Technology => "TECHNOLOGY",
            EventCategory::Business => "BUSINESS",
            EventCategory::Design => "DESIGN",
            EventCategory::Social => "SOCIAL",
            EventCategory::Networking => "NETWORKING",
            EventCategory::Education => "EDUCATION",
            EventCategory::Health => "HEALTH",
            EventCategory::Sports => "SPORTS",
            EventCategory::Music => "MUSIC",
            EventCategory::Art => "ART",
            EventCategory::Food => "FOOD",
            EventCategory::Travel => "TRAVEL",
            EventCategory::Other => "OTHER",
        }
    }
}

impl FromStr for EventCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TECHNOLOGY" => Ok(EventCategory::Technology),
            "BUSINESS" => Ok(EventCategory::Business),
            "DESIGN" => Ok(EventCategory::Design),
            "SOCIAL" => Ok(EventCategory::Social),
            "NETWORKING" => Ok(EventCategory::Networking),
            "EDUCATION" => Ok(EventCategory::Education),
            "HEALTH" => Ok(EventCategory::Health),
            "SPORTS" => Ok(EventCategory::Sports),
            "MUSIC" => Ok(EventCategory::Music),
            "ART" => Ok(EventCategory::Art),
            "FOOD" => Ok(EventCategory::Food),
            "TRAVEL" => Ok(EventCategory::Travel),
            "OTHER" => Ok(EventCategory::Other),
            other => Err(Error::validation(format!("invalid category: {other}"))),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's attendance intent for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsvpStatus {
    Going,
    Maybe,
    NotGoing,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Going => "GOING",
            RsvpStatus::Maybe => "MAYBE",
            RsvpStatus::NotGoing => "NOT_GOING",
        }
    }
}

impl FromStr for RsvpStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GOING" => Ok(RsvpStatus::Going),
            "MAYBE" => Ok(RsvpStatus::Maybe),
            "NOT_GOING" => Ok(RsvpStatus::NotGoing),
            other => Err(Error::validation(format!("invalid RSVP status: {other}"))),
        }
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host summary embedded in event responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventHost {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub verified: bool,
    /// Only populated on the event detail view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Event as returned by listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub address: Option<String>,
    pub category: EventCategory,
    /// Capacity; absent means unlimited
    pub max_attendees: Option<i32>,
    pub price: Option<f64>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub featured: bool,
    pub is_public: bool,
    pub host: EventHost,
    /// Count of GOING RSVPs at the moment of the read
    pub attendee_count: i64,
    pub like_count: i64,
    /// Whether the requesting user liked this event (false when anonymous)
    pub is_liked: bool,
    /// The requesting user's own RSVP, if any
    pub user_rsvp: Option<RsvpStatus>,
    pub created_at: DateTime<Utc>,
}

/// Event detail view: listing fields plus reviews
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub review_count: i64,
    /// Most recent reviews (capped at 5)
    pub reviews: Vec<Review>,
}

/// Persisted RSVP record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a successful attendance change
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceUpdate {
    #[serde(flatten)]
    pub rsvp: Rsvp,
    /// Refreshed GOING count after the change
    pub attendee_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub event_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub user: ReviewAuthor,
    pub created_at: DateTime<Utc>,
}
