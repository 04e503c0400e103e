pub mod auth;
pub mod catalog;
pub mod recipes;
pub mod serializers;
pub mod subscriptions;
pub mod users;

use crate::auth::permissions;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::{
    AuthResponse, AvatarRequest, AvatarResponse, CreatedUserResponse, IngredientAmountRequest,
    IngredientResponse, LoginRequest, RecipeIngredientResponse, RecipeResponse,
    RecipeShortResponse, RecipeWriteRequest, SetPasswordRequest, ShortLinkResponse, SignupRequest,
    SubscriptionResponse, TagResponse, UserResponse,
};
use crate::pagination::{RecipePage, SubscriptionPage, UserPage};
use actix_web::web;
use utoipa::{Modify, OpenApi};

/// Recipe images arrive inline as base64, so bodies are larger than usual.
const JSON_LIMIT: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        auth::login,
        auth::logout,
        // User endpoints
        users::register,
        users::list_users,
        users::get_user,
        users::me,
        users::set_avatar,
        users::delete_avatar,
        users::set_password,
        subscriptions::list_subscriptions,
        subscriptions::subscribe,
        subscriptions::unsubscribe,
        // Catalog endpoints
        catalog::list_tags,
        catalog::get_tag,
        catalog::list_ingredients,
        catalog::get_ingredient,
        // Recipe endpoints
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::get_link,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_cart,
        recipes::remove_from_cart,
        recipes::download_shopping_cart,
    ),
    components(schemas(
        // Auth schemas
        LoginRequest,
        AuthResponse,
        // User schemas
        SignupRequest,
        CreatedUserResponse,
        UserResponse,
        UserPage,
        AvatarRequest,
        AvatarResponse,
        SetPasswordRequest,
        SubscriptionResponse,
        SubscriptionPage,
        // Catalog schemas
        TagResponse,
        IngredientResponse,
        // Recipe schemas
        RecipeResponse,
        RecipePage,
        RecipeIngredientResponse,
        RecipeShortResponse,
        RecipeWriteRequest,
        IngredientAmountRequest,
        ShortLinkResponse,
    )),
    tags(
        (name = "auth", description = "Token authentication endpoints"),
        (name = "users", description = "Users, avatars and subscriptions"),
        (name = "catalog", description = "Read-only tags and ingredients"),
        (name = "recipes", description = "Recipes, favorites and the shopping cart"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            log::debug!("Rejected JSON body: {}", err);
            ApiError::Validation(ValidationErrors::single("non_field_errors", err.to_string()))
                .into()
        })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, _req| ApiError::not_found("Not found.").into())
}

/// Registers every `/api` route; shared by the server binary and the integration tests.
///
/// Literal segments (`me`, `subscriptions`, `download_shopping_cart`) are registered
/// before the `{id}` routes they would otherwise collide with.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth/token")
                        .route("/login/", web::post().to(auth::login))
                        .route("/logout/", web::post().to(auth::logout)),
                )
                .service(
                    web::scope("/users")
                        .route("/", web::get().to(users::list_users))
                        .route("/", web::post().to(users::register))
                        .route("/me/", web::get().to(users::me))
                        .route("/me/avatar/", web::put().to(users::set_avatar))
                        .route("/me/avatar/", web::delete().to(users::delete_avatar))
                        .route("/set_password/", web::post().to(users::set_password))
                        .route(
                            "/subscriptions/",
                            web::get().to(subscriptions::list_subscriptions),
                        )
                        .route("/{id}/", web::get().to(users::get_user))
                        .route(
                            "/{id}/subscribe/",
                            web::post().to(subscriptions::subscribe),
                        )
                        .route(
                            "/{id}/subscribe/",
                            web::delete().to(subscriptions::unsubscribe),
                        ),
                )
                .service(
                    web::scope("/tags")
                        .route("/", web::get().to(catalog::list_tags))
                        .route("/{id}/", web::get().to(catalog::get_tag)),
                )
                .service(
                    web::scope("/ingredients")
                        .route("/", web::get().to(catalog::list_ingredients))
                        .route("/{id}/", web::get().to(catalog::get_ingredient)),
                )
                .service(
                    web::scope("/recipes")
                        .wrap_fn(|req, srv| permissions::require_auth_for_writes(req, srv))
                        .route("/", web::get().to(recipes::list_recipes))
                        .route("/", web::post().to(recipes::create_recipe))
                        .route(
                            "/download_shopping_cart/",
                            web::get().to(recipes::download_shopping_cart),
                        )
                        .route("/{id}/", web::get().to(recipes::get_recipe))
                        .route("/{id}/", web::patch().to(recipes::update_recipe))
                        .route("/{id}/", web::delete().to(recipes::delete_recipe))
                        .route("/{id}/get-link/", web::get().to(recipes::get_link))
                        .route("/{id}/favorite/", web::post().to(recipes::add_favorite))
                        .route("/{id}/favorite/", web::delete().to(recipes::remove_favorite))
                        .route("/{id}/shopping_cart/", web::post().to(recipes::add_to_cart))
                        .route(
                            "/{id}/shopping_cart/",
                            web::delete().to(recipes::remove_from_cart),
                        ),
                ),
        );
}
