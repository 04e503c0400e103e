//! HS256 bearer tokens. The only identity they carry is the user id in `sub`;
//! logout is client-side since nothing is stored server-side.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i32, expiration_hours: i64) -> Self {
        let now = Utc::now();
        Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::hours(expiration_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

pub fn create_token(claims: &Claims, secret: &str) -> Result<String, anyhow::Error> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Checks signature and expiry; the subject is validated by the caller.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, anyhow::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_carries_the_user_id() {
        let token = create_token(&Claims::new(42, 1), "secret").unwrap();

        let decoded = verify_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id(), Some(42));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(&Claims::new(1, 1), "secret").unwrap();

        assert!(verify_token(&token, "another-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token(&Claims::new(1, -2), "secret").unwrap();

        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn non_numeric_subject_has_no_user_id() {
        let claims = Claims {
            sub: "cook".to_string(),
            exp: 0,
            iat: 0,
        };
        assert_eq!(claims.user_id(), None);
    }
}
