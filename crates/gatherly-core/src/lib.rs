// Domain types shared between the storage layer and the HTTP API
//
// This crate carries the public DTOs (events, RSVPs, users, reviews) and the
// error taxonomy every operation reports through.

pub mod error;
pub mod event;
pub mod user;

pub use error::{Error, Result};
pub use event::{
    AttendanceUpdate, Event, EventCategory, EventDetail, EventHost, Review, ReviewAuthor, Rsvp,
    RsvpStatus,
};
pub use user::{CurrentUser, PublicProfile, UserCounts};
