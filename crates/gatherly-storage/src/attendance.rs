// Attendance manager: RSVP upsert, capacity enforcement, and maintenance of
// the cached attendee count.
//
// Invariant: events.current_attendees always equals the count of rsvps rows
// with status GOING for that event. The whole transition runs inside one
// transaction holding a row lock on the event, so concurrent attendance
// changes on the same event serialize while different events never contend.

use gatherly_core::{Error, Result, RsvpStatus};
use uuid::Uuid;

use crate::models::RsvpRow;
use crate::repositories::Database;

/// Result of a committed attendance change
#[derive(Debug, Clone)]
pub struct AttendanceChange {
    pub rsvp: RsvpRow,
    /// Exact GOING count after the change
    pub attendee_count: i64,
}

/// Capacity admission: a GOING request is admissible when the event is
/// unlimited or the number of *other* users already GOING is below capacity.
/// The acting user's own existing GOING row is excluded from the count, so a
/// re-confirmation at full capacity is a no-op rather than a rejection.
pub fn capacity_admits(max_attendees: Option<i32>, others_going: i64) -> bool {
    match max_attendees {
        Some(max) => others_going < i64::from(max),
        None => true,
    }
}

impl Database {
    /// Set the acting user's attendance for an event.
    ///
    /// Fails with `NotFound` if the event does not exist and
    /// `CapacityExceeded` if a GOING request would push the event past its
    /// capacity. On success the RSVP upsert and the count refresh commit
    /// atomically.
    pub async fn set_attendance(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> Result<AttendanceChange> {
        let mut tx = self.pool().begin().await?;

        // Row lock serializes concurrent attendance changes per event
        let max_attendees = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT max_attendees FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::NotFound("Event"))?;

        if status == RsvpStatus::Going {
            // Pre-transition count, excluding the acting user's own row
            let others_going = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM rsvps \
                 WHERE event_id = $1 AND status = 'GOING' AND user_id <> $2",
            )
            .bind(event_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            if !capacity_admits(max_attendees, others_going) {
                // Dropping the transaction rolls it back; nothing was written
                return Err(Error::CapacityExceeded);
            }
        }

        let rsvp = sqlx::query_as::<_, RsvpRow>(
            "INSERT INTO rsvps (id, user_id, event_id, status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, event_id) \
             DO UPDATE SET status = EXCLUDED.status, updated_at = NOW() \
             RETURNING id, user_id, event_id, status, created_at, updated_at",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(event_id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        // Recompute the derived count from the source of truth
        let attendee_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM rsvps WHERE event_id = $1 AND status = 'GOING'",
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE events SET current_attendees = $2, updated_at = NOW() WHERE id = $1")
            .bind(event_id)
            .bind(attendee_count as i32)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            event_id = %event_id,
            user_id = %user_id,
            status = %status,
            attendee_count,
            "attendance updated"
        );

        Ok(AttendanceChange {
            rsvp,
            attendee_count,
        })
    }

    /// Toggle the acting user's like for an event. Returns whether the event
    /// is liked after the call.
    pub async fn toggle_like(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        if self.get_event(event_id).await?.is_none() {
            return Err(Error::NotFound("Event"));
        }

        let deleted = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(self.pool())
            .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO likes (id, user_id, event_id) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, event_id) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(event_id)
        .execute(self.pool())
        .await?;

        Ok(true)
    }
}
