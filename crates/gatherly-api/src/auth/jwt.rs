// JWT issuance and verification
// Decision: one signing secret, with a `kind` claim separating access tokens
// from refresh tokens so one can never be replayed as the other

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::JwtConfig;
use gatherly_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    pub kind: TokenKind,
}

/// Access/refresh token pair handed out at login and refresh
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub fn issue_pair(config: &JwtConfig, user_id: Uuid) -> Result<TokenPair> {
    Ok(TokenPair {
        access_token: issue(config, user_id, TokenKind::Access)?,
        refresh_token: issue(config, user_id, TokenKind::Refresh)?,
    })
}

fn issue(config: &JwtConfig, user_id: Uuid, kind: TokenKind) -> Result<String> {
    let now = Utc::now().timestamp();
    let lifetime = match kind {
        TokenKind::Access => config.access_token_lifetime,
        TokenKind::Refresh => config.refresh_token_lifetime,
    };
    let claims = Claims {
        sub: user_id,
        exp: now + lifetime.as_secs() as i64,
        iat: now,
        kind,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| Error::unauthorized(format!("failed to sign token: {e}")))
}

pub fn verify(config: &JwtConfig, token: &str, expected: TokenKind) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| Error::unauthorized("Invalid or expired token"))?;

    if data.claims.kind != expected {
        return Err(Error::unauthorized("Invalid or expired token"));
    }

    Ok(data.claims)
}
