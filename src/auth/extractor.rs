use crate::auth::verify_token;
use crate::config::Config;
use crate::errors::ApiError;
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Caller identified by a valid `Authorization: Bearer <jwt>` header.
///
/// Use `Option<AuthenticatedUser>` for endpoints that also serve anonymous callers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

impl AuthenticatedUser {
    pub fn from_headers(headers: &HeaderMap, config: &Config) -> Result<Self, ApiError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(ApiError::unauthorized)?;

        let user_id = verify_token(token, &config.auth.jwt_secret)
            .ok()
            .and_then(|claims| claims.user_id())
            .ok_or_else(|| ApiError::Unauthorized("Invalid token.".to_string()))?;

        Ok(AuthenticatedUser { user_id })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<Config>>() {
            Some(config) => AuthenticatedUser::from_headers(req.headers(), config),
            None => {
                log::error!("Config is not registered as app data");
                Err(ApiError::unauthorized())
            }
        };
        ready(result.map_err(Error::from))
    }
}
