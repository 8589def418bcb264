//! HS256 bearer access tokens

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Secret used when `JWT_SECRET` is unset (development only)
pub const DEFAULT_JWT_SECRET: &str = "dev_secret_change_me";

/// Token lifetime used when `JWT_EXPIRES_SECONDS` is unset
pub const DEFAULT_JWT_EXPIRES_SECONDS: i64 = 3600;

/// Access token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_seconds: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
            expires_seconds: DEFAULT_JWT_EXPIRES_SECONDS,
        }
    }
}

impl JwtConfig {
    /// Read `JWT_SECRET` and `JWT_EXPIRES_SECONDS`
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!("JWT_SECRET not set, using the development default");
                DEFAULT_JWT_SECRET.to_string()
            });
        let expires_seconds = std::env::var("JWT_EXPIRES_SECONDS")
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_JWT_EXPIRES_SECONDS);

        Self {
            secret,
            expires_seconds,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Sign an access token for `user_id`
pub fn issue_token(
    config: &JwtConfig,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::seconds(config.expires_seconds)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// User id carried by a valid token; `None` for any decode or claim failure
pub fn verify_token(config: &JwtConfig, token: &str) -> Option<i64> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .ok()?;
    data.claims.sub.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let config = JwtConfig::default();
        let token = issue_token(&config, 42, Utc::now()).unwrap();
        assert_eq!(verify_token(&config, &token), Some(42));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(&JwtConfig::default(), 1, Utc::now()).unwrap();
        let other = JwtConfig {
            secret: "another".to_string(),
            ..Default::default()
        };
        assert_eq!(verify_token(&other, &token), None);
    }

    #[test]
    fn test_expired_rejected() {
        let config = JwtConfig::default();
        let token = issue_token(&config, 1, Utc::now() - Duration::days(1)).unwrap();
        assert_eq!(verify_token(&config, &token), None);
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let config = JwtConfig::default();
        let claims = Claims {
            sub: "alice".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert_eq!(verify_token(&config, &token), None);
        assert_eq!(verify_token(&config, "garbage"), None);
    }
}
