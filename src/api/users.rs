use crate::api::serializers;
use crate::auth::{hash_password, verify_password, AuthenticatedUser};
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::user;
use crate::errors::{ApiError, ApiResult, ValidationErrors};
use crate::models::{
    AvatarRequest, AvatarResponse, CreatedUserResponse, SetPasswordRequest, SignupRequest,
};
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::repository::users::{self, NewUser};
use crate::services::media::{self, MediaStorage};
use crate::services::user_validation::validate_signup;
use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::SqlErr;
use validator::Validate;

/// The caller's own row; a token for a deleted user is treated as anonymous.
pub(crate) async fn current_user(
    pool: &DbPool,
    caller: &AuthenticatedUser,
) -> ApiResult<user::Model> {
    users::find_by_id(pool, caller.user_id)
        .await?
        .ok_or_else(ApiError::unauthorized)
}

#[utoipa::path(
    post,
    path = "/api/users/",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered", body = CreatedUserResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "users"
)]
pub async fn register(
    req: web::Json<SignupRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let req = req.into_inner();
    validate_signup(&req).into_result(())?;

    let new_user = NewUser {
        email: req.email,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        password_hash: hash_password(&req.password, config.auth.bcrypt_cost)?,
    };

    let mut errors = ValidationErrors::new();
    for field in users::find_taken(pool.get_ref(), &new_user).await? {
        errors.add(field, format!("A user with that {} already exists.", field));
    }
    errors.into_result(())?;

    let created = match users::create(pool.get_ref(), new_user).await {
        Ok(created) => created,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(ApiError::Validation(ValidationErrors::single(
                "non_field_errors",
                "A user with these details already exists.",
            )));
        }
        Err(e) => return Err(e.into()),
    };

    log::info!("Registered user {} ({})", created.id, created.username);
    Ok(HttpResponse::Created().json(CreatedUserResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/api/users/",
    params(PageQuery),
    responses(
        (status = 200, description = "Users ordered by username", body = UserPage),
        (status = 404, description = "Invalid page")
    ),
    tag = "users"
)]
pub async fn list_users(
    http: HttpRequest,
    query: web::Query<PageQuery>,
    caller: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let page = PageRequest::try_from(&*query)?;
    let (models, total) = users::page(pool.get_ref(), &page).await?;
    page.check_range(total)?;

    let viewer = caller.map(|c| c.user_id);
    let results = serializers::users(pool.get_ref(), &media, viewer, &models).await?;
    Ok(HttpResponse::Ok().json(Page::new(results, total, &page, &http)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "Not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    path: web::Path<i32>,
    caller: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let model = users::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("User with the given id was not found."))?;

    let viewer = caller.map(|c| c.user_id);
    let shaped = serializers::user(pool.get_ref(), &media, viewer, &model).await?;
    Ok(HttpResponse::Ok().json(shaped))
}

#[utoipa::path(
    get,
    path = "/api/users/me/",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn me(
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let model = current_user(pool.get_ref(), &caller).await?;
    let shaped = serializers::user(pool.get_ref(), &media, Some(caller.user_id), &model).await?;
    Ok(HttpResponse::Ok().json(shaped))
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar/",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar updated", body = AvatarResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn set_avatar(
    req: web::Json<AvatarRequest>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let model = current_user(pool.get_ref(), &caller).await?;

    let data = req
        .avatar
        .as_deref()
        .filter(|data| !data.is_empty())
        .ok_or_else(|| {
            ApiError::Validation(ValidationErrors::single("avatar", "This field is required."))
        })?;
    let image = media::decode_data_uri(data)
        .map_err(|message| ApiError::Validation(ValidationErrors::single("avatar", message)))?;

    let stored = media.save(media::AVATARS, &image).await?;
    let previous = model.avatar.clone();
    let updated = match users::set_avatar(pool.get_ref(), model, Some(stored.clone())).await {
        Ok(updated) => updated,
        Err(e) => {
            media.delete(&stored).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = previous {
        media.delete(&previous).await;
    }

    Ok(HttpResponse::Ok().json(AvatarResponse {
        avatar: updated.avatar.as_deref().map(|path| media.url(path)),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar/",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn delete_avatar(
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let model = current_user(pool.get_ref(), &caller).await?;
    if let Some(previous) = model.avatar.clone() {
        users::set_avatar(pool.get_ref(), model, None).await?;
        media.delete(&previous).await;
    }
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/users/set_password/",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn set_password(
    req: web::Json<SetPasswordRequest>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let model = current_user(pool.get_ref(), &caller).await?;

    let mut errors = req
        .validate()
        .map_or_else(ValidationErrors::from, |()| ValidationErrors::new());
    if !verify_password(&req.current_password, &model.password_hash)? {
        errors.add("current_password", "Invalid password.");
    }
    errors.into_result(())?;

    let password_hash = hash_password(&req.new_password, config.auth.bcrypt_cost)?;
    users::set_password_hash(pool.get_ref(), model, password_hash).await?;

    log::info!("User {} changed password", caller.user_id);
    Ok(HttpResponse::NoContent().finish())
}
