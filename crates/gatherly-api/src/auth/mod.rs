// Authentication: JWT access/refresh pairs, bearer extractors, and the
// account lifecycle routes.

pub mod config;
pub mod extract;
pub mod jwt;
pub mod routes;

pub use config::AuthConfig;
pub use extract::{AuthUser, AuthVerifier, OptionalAuthUser};
pub use routes::{routes, AuthState};
