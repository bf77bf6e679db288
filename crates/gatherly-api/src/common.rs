// Common DTOs for the public API

use gatherly_core::Event;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pagination metadata returned alongside paged listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        // Equivalent of the unstable `i64::div_ceil` (rounds toward positive infinity)
        let quot = total / limit;
        let rem = total % limit;
        let total_pages = if rem != 0 && (rem > 0) == (limit > 0) {
            quot + 1
        } else {
            quot
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Paged event listing response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    pub events: Vec<Event>,
    pub pagination: Pagination,
}

/// Generic message-only response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
