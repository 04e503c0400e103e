use crate::auth::{create_token, verify_password, AuthenticatedUser, Claims};
use crate::config::Config;
use crate::db::DbPool;
use crate::errors::{ApiError, ApiResult, ValidationErrors};
use crate::models::{AuthResponse, LoginRequest};
use crate::repository::users;
use actix_web::{web, HttpResponse};

fn invalid_credentials() -> ApiError {
    ApiError::Validation(ValidationErrors::single(
        "non_field_errors",
        "Unable to log in with provided credentials.",
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/token/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    req: web::Json<LoginRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let user = users::find_by_email(pool.get_ref(), &req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        log::info!("Failed login attempt for user {}", user.id);
        return Err(invalid_credentials());
    }

    let claims = Claims::new(user.id, config.auth.jwt_expiration_hours);
    let auth_token = create_token(&claims, &config.auth.jwt_secret)?;

    log::info!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(AuthResponse { auth_token }))
}

/// Tokens are stateless; this only confirms the caller was authenticated.
#[utoipa::path(
    post,
    path = "/api/auth/token/logout/",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "auth"
)]
pub async fn logout(user: AuthenticatedUser) -> ApiResult<HttpResponse> {
    log::info!("User {} logged out", user.user_id);
    Ok(HttpResponse::NoContent().finish())
}
