// Event DTO assembly
//
// Storage keeps category and RSVP status as TEXT guarded by CHECK
// constraints, so parsing here cannot fail for rows the database accepts;
// unknown values degrade instead of erroring.

use gatherly_core::{
    AttendanceUpdate, Event, EventCategory, EventDetail, EventHost, Review, ReviewAuthor, Rsvp,
    RsvpStatus,
};
use gatherly_storage::models::{EventWithHostRow, ReviewWithAuthorRow};
use gatherly_storage::AttendanceChange;

/// Event as shown in listings; the host bio is withheld
pub fn listing_event(row: EventWithHostRow) -> Event {
    event_from_row(row, false)
}

/// Full detail view with host bio, review count and recent reviews
pub fn detail_event(
    row: EventWithHostRow,
    review_count: i64,
    reviews: Vec<ReviewWithAuthorRow>,
) -> EventDetail {
    EventDetail {
        event: event_from_row(row, true),
        review_count,
        reviews: reviews.into_iter().map(review).collect(),
    }
}

fn event_from_row(row: EventWithHostRow, include_host_bio: bool) -> Event {
    Event {
        id: row.id,
        title: row.title,
        description: row.description,
        start_date: row.start_date,
        end_date: row.end_date,
        location: row.location,
        address: row.address,
        category: row.category.parse().unwrap_or(EventCategory::Other),
        max_attendees: row.max_attendees,
        price: row.price,
        cover_image: row.cover_image,
        tags: row.tags,
        featured: row.featured,
        is_public: row.is_public,
        host: EventHost {
            id: row.host_id,
            username: row.host_username,
            first_name: row.host_first_name,
            last_name: row.host_last_name,
            avatar: row.host_avatar,
            verified: row.host_verified,
            bio: if include_host_bio { row.host_bio } else { None },
        },
        attendee_count: row.attendee_count,
        like_count: row.like_count,
        is_liked: row.is_liked,
        user_rsvp: row.user_rsvp.and_then(|s| s.parse().ok()),
        created_at: row.created_at,
    }
}

pub fn attendance_update(change: AttendanceChange) -> AttendanceUpdate {
    AttendanceUpdate {
        rsvp: Rsvp {
            id: change.rsvp.id,
            user_id: change.rsvp.user_id,
            event_id: change.rsvp.event_id,
            status: change.rsvp.status.parse().unwrap_or(RsvpStatus::NotGoing),
            created_at: change.rsvp.created_at,
            updated_at: change.rsvp.updated_at,
        },
        attendee_count: change.attendee_count,
    }
}

pub fn review(row: ReviewWithAuthorRow) -> Review {
    Review {
        id: row.id,
        event_id: row.event_id,
        rating: row.rating,
        comment: row.comment,
        user: ReviewAuthor {
            username: row.author_username,
            first_name: row.author_first_name,
            last_name: row.author_last_name,
            avatar: row.author_avatar,
        },
        created_at: row.created_at,
    }
}
