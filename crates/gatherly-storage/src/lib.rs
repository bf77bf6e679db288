// Postgres storage layer with sqlx
//
// The `Database` handle owns the connection pool and exposes repository
// methods per table, plus the attendance manager (RSVP capacity logic).

pub mod attendance;
pub mod models;
pub mod password;
pub mod repositories;

pub use attendance::AttendanceChange;
pub use models::*;
pub use repositories::Database;
