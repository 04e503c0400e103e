use crate::db::DbPool;
use crate::errors::{ApiError, ApiResult};
use crate::models::{IngredientResponse, TagResponse};
use crate::repository::catalog;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/tags/",
    responses(
        (status = 200, description = "All tags", body = Vec<TagResponse>)
    ),
    tag = "catalog"
)]
pub async fn list_tags(pool: web::Data<DbPool>) -> ApiResult<HttpResponse> {
    let tags: Vec<TagResponse> = catalog::list_tags(pool.get_ref())
        .await?
        .into_iter()
        .map(TagResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(tags))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}/",
    params(("id" = i32, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Not found")
    ),
    tag = "catalog"
)]
pub async fn get_tag(path: web::Path<i32>, pool: web::Data<DbPool>) -> ApiResult<HttpResponse> {
    let tag = catalog::find_tag(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Tag with the given id was not found."))?;
    Ok(HttpResponse::Ok().json(TagResponse::from(tag)))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/",
    params(IngredientQuery),
    responses(
        (status = 200, description = "Ingredients ordered by name", body = Vec<IngredientResponse>)
    ),
    tag = "catalog"
)]
pub async fn list_ingredients(
    query: web::Query<IngredientQuery>,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let ingredients: Vec<IngredientResponse> =
        catalog::list_ingredients(pool.get_ref(), query.name.as_deref())
            .await?
            .into_iter()
            .map(IngredientResponse::from)
            .collect();
    Ok(HttpResponse::Ok().json(ingredients))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}/",
    params(("id" = i32, Path, description = "Ingredient id")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Not found")
    ),
    tag = "catalog"
)]
pub async fn get_ingredient(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let ingredient = catalog::find_ingredient(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient with the given id was not found."))?;
    Ok(HttpResponse::Ok().json(IngredientResponse::from(ingredient)))
}
