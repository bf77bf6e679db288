// Repository layer for database operations

use chrono::{DateTime, Utc};
use gatherly_core::{Error, Result};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::*;

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, password_hash, avatar, \
     bio, phone, location, website, verified, email_token, reset_token, reset_expires, \
     refresh_token, created_at, updated_at";

// Event select list, split around the two viewer binds (is_liked / user_rsvp).
// Static queries interpolate `$1` for the viewer; the filtered listing pushes
// the bind through QueryBuilder instead.
const EVENT_COLUMNS_HEAD: &str = "SELECT e.id, e.host_id, e.title, e.description, e.start_date, e.end_date, \
     e.location, e.address, e.category, e.max_attendees, e.current_attendees, e.price, \
     e.cover_image, e.tags, e.featured, e.is_public, e.canceled, e.published_at, \
     e.created_at, e.updated_at, \
     u.username AS host_username, u.first_name AS host_first_name, \
     u.last_name AS host_last_name, u.avatar AS host_avatar, \
     u.verified AS host_verified, u.bio AS host_bio, \
     (SELECT COUNT(*) FROM rsvps r WHERE r.event_id = e.id AND r.status = 'GOING') AS attendee_count, \
     (SELECT COUNT(*) FROM likes l WHERE l.event_id = e.id) AS like_count, \
     EXISTS(SELECT 1 FROM likes l WHERE l.event_id = e.id AND l.user_id = ";

const EVENT_COLUMNS_MID: &str = ") AS is_liked, \
     (SELECT r.status FROM rsvps r WHERE r.event_id = e.id AND r.user_id = ";

const EVENT_COLUMNS_TAIL: &str = ") AS user_rsvp \
     FROM events e JOIN users u ON u.id = e.host_id";

fn event_select(suffix: &str) -> String {
    format!("{EVENT_COLUMNS_HEAD}$1{EVENT_COLUMNS_MID}$1{EVENT_COLUMNS_TAIL} {suffix}")
}

/// Escape LIKE wildcards and wrap the term for a substring match
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Map a unique-constraint violation to a caller-facing conflict
fn map_unique(err: sqlx::Error, msg: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::conflict(msg),
        _ => Error::Store(err),
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Store(e.into()))?;
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUser) -> Result<UserRow> {
        let sql = format!(
            "INSERT INTO users (id, email, username, first_name, last_name, password_hash, email_token) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&input.email)
            .bind(&input.username)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.password_hash)
            .bind(&input.email_token)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "User with this email or username already exists"))?;

        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Look up the user only if the presented refresh token matches the stored one
    pub async fn get_user_by_refresh_token(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND refresh_token = $2");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(refresh_token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Consume an email verification token. Returns the verified user id.
    pub async fn verify_email(&self, token: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "UPDATE users SET verified = TRUE, email_token = NULL, updated_at = NOW() \
             WHERE email_token = $1 \
             RETURNING id",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_expires = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Consume an unexpired reset token, replacing the password and revoking
    /// the stored refresh token (forces re-login). Returns the user id.
    pub async fn reset_password(&self, token: &str, password_hash: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "UPDATE users SET password_hash = $2, reset_token = NULL, reset_expires = NULL, \
                 refresh_token = NULL, updated_at = NOW() \
             WHERE reset_token = $1 AND reset_expires > NOW() \
             RETURNING id",
        )
        .bind(token)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfile,
    ) -> Result<Option<UserRow>> {
        let sql = format!(
            "UPDATE users \
             SET first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 avatar = COALESCE($4, avatar), \
                 bio = COALESCE($5, bio), \
                 phone = COALESCE($6, phone), \
                 location = COALESCE($7, location), \
                 website = COALESCE($8, website), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.avatar)
            .bind(&input.bio)
            .bind(&input.phone)
            .bind(&input.location)
            .bind(&input.website)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn user_counts(&self, user_id: Uuid) -> Result<UserCountsRow> {
        let row = sqlx::query_as::<_, UserCountsRow>(
            "SELECT \
               (SELECT COUNT(*) FROM events e WHERE e.host_id = $1) AS hosted_events, \
               (SELECT COUNT(*) FROM rsvps r WHERE r.user_id = $1 AND r.status = 'GOING') AS attending, \
               (SELECT COUNT(*) FROM follows f WHERE f.followee_id = $1) AS followers, \
               (SELECT COUNT(*) FROM follows f WHERE f.follower_id = $1) AS following",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEvent) -> Result<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(
            "INSERT INTO events (id, host_id, title, description, start_date, end_date, location, \
                 address, category, max_attendees, price, cover_image, tags, is_public, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW()) \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.host_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.location)
        .bind(&input.address)
        .bind(input.category.as_str())
        .bind(input.max_attendees)
        .bind(input.price)
        .bind(&input.cover_image)
        .bind(&input.tags)
        .bind(input.is_public)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Event with host and viewer-dependent aggregates. No visibility filter;
    /// the service layer decides whether the viewer may see it.
    pub async fn get_event_with_host(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Option<EventWithHostRow>> {
        let sql = event_select("WHERE e.id = $2");
        let row = sqlx::query_as::<_, EventWithHostRow>(&sql)
            .bind(viewer)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list_events(
        &self,
        filter: &EventFilter,
        viewer: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventWithHostRow>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(EVENT_COLUMNS_HEAD);
        qb.push_bind(viewer);
        qb.push(EVENT_COLUMNS_MID);
        qb.push_bind(viewer);
        qb.push(EVENT_COLUMNS_TAIL);
        push_listing_filters(&mut qb, filter);
        qb.push(" ORDER BY e.featured DESC, e.start_date ASC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<EventWithHostRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Total under the same filter set as `list_events`
    pub async fn count_events(&self, filter: &EventFilter) -> Result<i64> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM events e");
        push_listing_filters(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    /// Upcoming public events ordered by popularity
    pub async fn trending_events(&self, viewer: Option<Uuid>) -> Result<Vec<EventWithHostRow>> {
        let sql = event_select(
            "WHERE e.is_public = TRUE AND e.canceled = FALSE AND e.start_date >= NOW() \
             ORDER BY e.featured DESC, e.current_attendees DESC, e.created_at DESC \
             LIMIT 10",
        );
        let rows = sqlx::query_as::<_, EventWithHostRow>(&sql)
            .bind(viewer)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Published public events hosted by one user
    pub async fn list_events_by_host(
        &self,
        host_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Vec<EventWithHostRow>> {
        let sql = event_select(
            "WHERE e.host_id = $2 AND e.is_public = TRUE AND e.published_at IS NOT NULL \
             ORDER BY e.start_date ASC",
        );
        let rows = sqlx::query_as::<_, EventWithHostRow>(&sql)
            .bind(viewer)
            .bind(host_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    // ============================================
    // Reviews
    // ============================================

    pub async fn create_review(&self, input: CreateReview) -> Result<ReviewWithAuthorRow> {
        let row = sqlx::query_as::<_, ReviewWithAuthorRow>(
            "WITH ins AS ( \
                 INSERT INTO reviews (id, user_id, event_id, rating, comment) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, user_id, event_id, rating, comment, created_at \
             ) \
             SELECT ins.id, ins.event_id, ins.rating, ins.comment, ins.created_at, \
                    u.username AS author_username, u.first_name AS author_first_name, \
                    u.last_name AS author_last_name, u.avatar AS author_avatar \
             FROM ins JOIN users u ON u.id = ins.user_id",
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(input.event_id)
        .bind(input.rating)
        .bind(&input.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "You have already reviewed this event"))?;

        Ok(row)
    }

    pub async fn list_recent_reviews(
        &self,
        event_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ReviewWithAuthorRow>> {
        let rows = sqlx::query_as::<_, ReviewWithAuthorRow>(
            "SELECT r.id, r.event_id, r.rating, r.comment, r.created_at, \
                    u.username AS author_username, u.first_name AS author_first_name, \
                    u.last_name AS author_last_name, u.avatar AS author_avatar \
             FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = $1 \
             ORDER BY r.created_at DESC \
             LIMIT $2",
        )
        .bind(event_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_reviews(&self, event_id: Uuid) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    // ============================================
    // Follows
    // ============================================

    /// Toggle the follow edge. Returns whether the follower now follows the
    /// followee.
    pub async fn toggle_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let deleted =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&self.pool)
                .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO follows (id, follower_id, followee_id) VALUES ($1, $2, $3) \
             ON CONFLICT (follower_id, followee_id) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }
}

fn push_listing_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    // Discovery listing only ever shows public, live, published, future events
    qb.push(" WHERE e.is_public = TRUE AND e.canceled = FALSE AND e.published_at IS NOT NULL");
    qb.push(" AND e.start_date >= ");
    qb.push_bind(filter.start_date_from.unwrap_or_else(Utc::now));

    if let Some(to) = filter.start_date_to {
        qb.push(" AND e.start_date <= ");
        qb.push_bind(to);
    }

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (e.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR e.description ILIKE ");
        qb.push_bind(pattern);
        qb.push(" OR ");
        qb.push_bind(search.clone());
        qb.push(" = ANY(e.tags))");
    }

    if let Some(category) = filter.category {
        qb.push(" AND e.category = ");
        qb.push_bind(category.as_str());
    }

    if let Some(location) = &filter.location {
        qb.push(" AND e.location ILIKE ");
        qb.push_bind(like_pattern(location));
    }

    if let Some(min) = filter.price_min {
        qb.push(" AND e.price >= ");
        qb.push_bind(min);
    }

    if let Some(max) = filter.price_max {
        qb.push(" AND e.price <= ");
        qb.push_bind(max);
    }

    if filter.featured == Some(true) {
        qb.push(" AND e.featured = TRUE");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn listing_filters_compose() {
        let filter = EventFilter {
            search: Some("wine".into()),
            category: Some(gatherly_core::EventCategory::Social),
            location: Some("San Francisco".into()),
            price_min: Some(0.0),
            price_max: Some(100.0),
            featured: Some(true),
            ..Default::default()
        };

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM events e");
        push_listing_filters(&mut qb, &filter);
        let sql = qb.sql();

        assert!(sql.contains("e.is_public = TRUE"));
        assert!(sql.contains("e.canceled = FALSE"));
        assert!(sql.contains("e.published_at IS NOT NULL"));
        assert!(sql.contains("e.title ILIKE"));
        assert!(sql.contains("ANY(e.tags)"));
        assert!(sql.contains("e.category ="));
        assert!(sql.contains("e.location ILIKE"));
        assert!(sql.contains("e.price >="));
        assert!(sql.contains("e.price <="));
        assert!(sql.contains("e.featured = TRUE"));
    }

    #[test]
    fn unfiltered_listing_still_restricts_visibility() {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM events e");
        push_listing_filters(&mut qb, &EventFilter::default());
        let sql = qb.sql();

        assert!(sql.contains("e.is_public = TRUE"));
        assert!(sql.contains("e.start_date >= "));
        assert!(!sql.contains("e.featured = TRUE"));
    }
}
