// Error taxonomy for business operations
//
// Every variant except `Store` is caller-correctable. `Store` wraps the
// underlying persistence failure; transactions guarantee it never leaves
// partial writes behind, so the caller may safely retry.

use thiserror::Error;

/// Result type alias for business operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Referenced entity does not exist (or is not visible to the caller)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Business-rule rejection: the event has no remaining capacity
    #[error("Event is at full capacity")]
    CapacityExceeded,

    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Uniqueness violation (duplicate email, username, review, ...)
    #[error("{0}")]
    Conflict(String),

    /// Underlying persistence failure
    #[error("storage error")]
    Store(#[from] sqlx::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Error::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    /// Whether the error is safe to expose verbatim to API clients
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Error::Store(_))
    }
}
