use crate::api::serializers;
use crate::auth::AuthenticatedUser;
use crate::db::DbPool;
use crate::errors::ApiResult;
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::repository::users;
use crate::services::media::MediaStorage;
use crate::services::subscriptions::{self, parse_recipes_limit};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipesLimitQuery {
    /// Recipes shown per author; absent or non-numeric shows all.
    pub recipes_limit: Option<String>,
}

impl RecipesLimitQuery {
    fn limit(&self) -> Option<u64> {
        parse_recipes_limit(self.recipes_limit.as_deref())
    }
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    params(PageQuery, RecipesLimitQuery),
    responses(
        (status = 200, description = "Followed authors", body = SubscriptionPage),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn list_subscriptions(
    http: HttpRequest,
    query: web::Query<PageQuery>,
    limit: web::Query<RecipesLimitQuery>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let page = PageRequest::try_from(&*query)?;
    let (authors, total) =
        users::followed_authors_page(pool.get_ref(), caller.user_id, &page).await?;
    page.check_range(total)?;

    let results = serializers::subscriptions(
        pool.get_ref(),
        &media,
        caller.user_id,
        &authors,
        limit.limit(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(Page::new(results, total, &page, &http)))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe/",
    params(
        ("id" = i32, Path, description = "Author id"),
        RecipesLimitQuery
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Cannot subscribe to yourself"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Author not found"),
        (status = 409, description = "Already subscribed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn subscribe(
    path: web::Path<i32>,
    limit: web::Query<RecipesLimitQuery>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let author = subscriptions::subscribe(pool.get_ref(), caller.user_id, path.into_inner()).await?;

    let mut shaped = serializers::subscriptions(
        pool.get_ref(),
        &media,
        caller.user_id,
        std::slice::from_ref(&author),
        limit.limit(),
    )
    .await?;
    Ok(HttpResponse::Created().json(shaped.remove(0)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe/",
    params(("id" = i32, Path, description = "Author id")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Author not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn unsubscribe(
    path: web::Path<i32>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    subscriptions::unsubscribe(pool.get_ref(), caller.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
