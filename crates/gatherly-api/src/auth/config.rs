// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config, with safe dev defaults

use std::time::Duration;

/// JWT signing configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWTs
    pub secret: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime
    pub refresh_token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_lifetime: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_lifetime: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Base URL of the web frontend, used in verification and reset links
    pub frontend_url: String,
    /// Request budget for the auth endpoints, per minute
    pub rate_limit_per_minute: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            frontend_url: "http://localhost:3000".to_string(),
            rate_limit_per_minute: 100,
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let secret = std::env::var("AUTH_JWT_SECRET").unwrap_or_else(|_| {
            // Generate a random secret so a dev instance still works; tokens
            // will not survive a restart
            use rand::Rng;
            let bytes: [u8; 32] = rand::thread_rng().gen();
            tracing::warn!("AUTH_JWT_SECRET not set, generated an ephemeral secret");
            hex::encode(bytes)
        });

        let access_token_lifetime = std::env::var("AUTH_ACCESS_TOKEN_LIFETIME")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(15 * 60));

        let refresh_token_lifetime = std::env::var("AUTH_REFRESH_TOKEN_LIFETIME")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(7 * 24 * 60 * 60));

        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let rate_limit_per_minute = std::env::var("AUTH_RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            jwt: JwtConfig {
                secret,
                access_token_lifetime,
                refresh_token_lifetime,
            },
            frontend_url,
            rate_limit_per_minute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.jwt.access_token_lifetime, Duration::from_secs(900));
        assert_eq!(
            config.jwt.refresh_token_lifetime,
            Duration::from_secs(7 * 24 * 60 * 60)
        );
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.rate_limit_per_minute, 100);
    }
}
