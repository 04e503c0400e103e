use crate::api::serializers;
use crate::api::users::current_user;
use crate::auth::permissions::ensure_author;
use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::recipe;
use crate::errors::{ApiError, ApiResult, ValidationErrors};
use crate::models::{RecipeShortResponse, RecipeWriteRequest, ShortLinkResponse};
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::repository::catalog;
use crate::repository::recipes::{self, RecipeChanges, RecipeFields, RecipeFilter};
use crate::services::media::{MediaStorage, RECIPE_IMAGES};
use crate::services::membership::{self, Membership};
use crate::services::recipe_validation::{validate, KnownIds, Mode, ValidRecipe};
use crate::services::shopping_list;
use actix_web::http::header::CONTENT_DISPOSITION;
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use url::form_urlencoded;
use utoipa::IntoParams;

/// Single-valued filters of the recipe list; `tags` repeats and is read separately.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// Author id
    pub author: Option<String>,
    /// `1` to show only the caller's favorites
    pub is_favorited: Option<String>,
    /// `1` to show only recipes in the caller's cart
    pub is_in_shopping_cart: Option<String>,
}

fn flag(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "True"))
}

/// Every non-empty `tags` value; the typed extractor keeps only one per key.
fn tag_slugs(query: &str) -> Vec<String> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, value)| key == "tags" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .collect()
}

impl RecipeListQuery {
    /// Membership flags only narrow the list for authenticated callers.
    pub fn into_filter(
        &self,
        tag_slugs: Vec<String>,
        viewer: Option<i32>,
    ) -> ApiResult<RecipeFilter> {
        let author = self
            .author
            .as_deref()
            .map(|raw| raw.trim().parse::<i32>())
            .transpose()
            .map_err(|_| {
                ApiError::Validation(ValidationErrors::single("author", "Enter a number."))
            })?;
        Ok(RecipeFilter {
            author,
            tag_slugs,
            favorited_by: viewer.filter(|_| flag(self.is_favorited.as_deref())),
            in_cart_of: viewer.filter(|_| flag(self.is_in_shopping_cart.as_deref())),
        })
    }
}

fn recipe_not_found() -> ApiError {
    ApiError::not_found("Recipe with the given id was not found.")
}

async fn find_recipe(pool: &DbPool, id: i32) -> ApiResult<recipe::Model> {
    recipes::find_by_id(pool, id)
        .await?
        .ok_or_else(recipe_not_found)
}

async fn validate_write(
    pool: &DbPool,
    req: &RecipeWriteRequest,
    mode: Mode,
) -> ApiResult<ValidRecipe> {
    let ingredient_ids: Vec<i32> = req
        .ingredients
        .iter()
        .flatten()
        .map(|item| item.id)
        .collect();
    let tag_ids: Vec<i32> = req.tags.iter().flatten().copied().collect();

    let known = KnownIds {
        ingredients: catalog::existing_ingredient_ids(pool, &ingredient_ids).await?,
        tags: catalog::existing_tag_ids(pool, &tag_ids).await?,
    };
    validate(req, mode, &known).map_err(ApiError::Validation)
}

#[utoipa::path(
    get,
    path = "/api/recipes/",
    params(
        PageQuery,
        RecipeListQuery,
        ("tags" = Option<Vec<String>>, Query, description = "Tag slugs, any of")
    ),
    responses(
        (status = 200, description = "Recipes, newest first", body = RecipePage),
        (status = 400, description = "Invalid filter"),
        (status = 404, description = "Invalid page")
    ),
    tag = "recipes"
)]
pub async fn list_recipes(
    http: HttpRequest,
    paging: web::Query<PageQuery>,
    query: web::Query<RecipeListQuery>,
    caller: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let page = PageRequest::try_from(&*paging)?;
    let viewer = caller.map(|c| c.user_id);
    let filter = query.into_filter(tag_slugs(http.query_string()), viewer)?;

    let (models, total) = recipes::page(pool.get_ref(), &filter, &page).await?;
    page.check_range(total)?;

    let results = serializers::recipes(pool.get_ref(), &media, viewer, models).await?;
    Ok(HttpResponse::Ok().json(Page::new(results, total, &page, &http)))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "Not found")
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    path: web::Path<i32>,
    caller: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let model = find_recipe(pool.get_ref(), path.into_inner()).await?;
    let viewer = caller.map(|c| c.user_id);
    let shaped = serializers::recipe(pool.get_ref(), &media, viewer, model).await?;
    Ok(HttpResponse::Ok().json(shaped))
}

#[utoipa::path(
    post,
    path = "/api/recipes/",
    request_body = RecipeWriteRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn create_recipe(
    req: web::Json<RecipeWriteRequest>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let author = current_user(pool.get_ref(), &caller).await?;
    let valid = validate_write(pool.get_ref(), &req, Mode::Create).await?;
    let image = valid.image.as_ref().ok_or_else(|| {
        ApiError::Validation(ValidationErrors::single("image", "This field is required."))
    })?;

    let stored = media.save(RECIPE_IMAGES, image).await?;
    let fields = RecipeFields {
        name: valid.name.clone().unwrap_or_default(),
        text: valid.text.clone().unwrap_or_default(),
        image: stored.clone(),
        cooking_time: valid.cooking_time.unwrap_or_default(),
    };
    let created = match recipes::create(
        pool.get_ref(),
        author.id,
        fields,
        &valid.ingredients,
        &valid.tags,
    )
    .await
    {
        Ok(created) => created,
        Err(e) => {
            media.delete(&stored).await;
            return Err(e.into());
        }
    };

    log::info!("User {} created recipe {}", author.id, created.id);
    let shaped = serializers::recipe(pool.get_ref(), &media, Some(author.id), created).await?;
    Ok(HttpResponse::Created().json(shaped))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}/",
    params(("id" = i32, Path, description = "Recipe id")),
    request_body = RecipeWriteRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn update_recipe(
    path: web::Path<i32>,
    req: web::Json<RecipeWriteRequest>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let existing = find_recipe(pool.get_ref(), path.into_inner()).await?;
    ensure_author(&Method::PATCH, Some(caller.user_id), existing.author_id)?;
    let valid = validate_write(pool.get_ref(), &req, Mode::Update).await?;

    let stored = match valid.image.as_ref() {
        Some(image) => Some(media.save(RECIPE_IMAGES, image).await?),
        None => None,
    };
    let previous_image = existing.image.clone();
    let changes = RecipeChanges {
        name: valid.name.clone(),
        text: valid.text.clone(),
        image: stored.clone(),
        cooking_time: valid.cooking_time,
    };

    let updated = match recipes::update(
        pool.get_ref(),
        existing,
        changes,
        &valid.ingredients,
        &valid.tags,
    )
    .await
    {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(stored) = &stored {
                media.delete(stored).await;
            }
            return Err(e.into());
        }
    };
    if stored.is_some() {
        media.delete(&previous_image).await;
    }

    log::info!("User {} updated recipe {}", caller.user_id, updated.id);
    let shaped = serializers::recipe(pool.get_ref(), &media, Some(caller.user_id), updated).await?;
    Ok(HttpResponse::Ok().json(shaped))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn delete_recipe(
    path: web::Path<i32>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    let existing = find_recipe(pool.get_ref(), path.into_inner()).await?;
    ensure_author(&Method::DELETE, Some(caller.user_id), existing.author_id)?;

    recipes::delete(pool.get_ref(), existing.id).await?;
    media.delete(&existing.image).await;

    log::info!("User {} deleted recipe {}", caller.user_id, existing.id);
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Public link", body = ShortLinkResponse),
        (status = 404, description = "Not found")
    ),
    tag = "recipes"
)]
pub async fn get_link(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let model = find_recipe(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ShortLinkResponse {
        short_link: config.recipe_link(model.id),
    }))
}

async fn add_membership(
    kind: Membership,
    recipe_id: i32,
    caller: &AuthenticatedUser,
    pool: &DbPool,
    media: &MediaStorage,
) -> ApiResult<HttpResponse> {
    current_user(pool, caller).await?;
    let model = membership::add(pool, kind, caller.user_id, recipe_id).await?;
    Ok(HttpResponse::Created().json(RecipeShortResponse::new(&model, media)))
}

async fn remove_membership(
    kind: Membership,
    recipe_id: i32,
    caller: &AuthenticatedUser,
    pool: &DbPool,
) -> ApiResult<HttpResponse> {
    current_user(pool, caller).await?;
    membership::remove(pool, kind, caller.user_id, recipe_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeShortResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found"),
        (status = 409, description = "Already in favorites")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_favorite(
    path: web::Path<i32>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    add_membership(Membership::Favorite, path.into_inner(), &caller, &pool, &media).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Recipe is not in favorites"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_favorite(
    path: web::Path<i32>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    remove_membership(Membership::Favorite, path.into_inner(), &caller, &pool).await
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 201, description = "Added to the shopping cart", body = RecipeShortResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found"),
        (status = 409, description = "Already in the shopping cart")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_to_cart(
    path: web::Path<i32>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
) -> ApiResult<HttpResponse> {
    add_membership(Membership::ShoppingCart, path.into_inner(), &caller, &pool, &media).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 400, description = "Recipe is not in the shopping cart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_from_cart(
    path: web::Path<i32>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    remove_membership(Membership::ShoppingCart, path.into_inner(), &caller, &pool).await
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart/",
    responses(
        (status = 200, description = "Shopping list as a text attachment", body = String, content_type = "text/plain"),
        (status = 400, description = "Shopping cart is empty"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn download_shopping_cart(
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let user = current_user(pool.get_ref(), &caller).await?;
    let lines = recipes::cart_lines(pool.get_ref(), user.id).await?;
    let text = shopping_list::build(&user.username, lines)
        .ok_or_else(|| ApiError::bad_request("Shopping cart is empty."))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header((
            CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                shopping_list::file_name(&user.username)
            ),
        ))
        .body(text))
}
