use crate::entities::recipe;
use crate::models::{TagResponse, UserResponse};
use crate::services::media::MediaStorage;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient id.
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Nested read shape of a recipe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Short projection used by favorites, cart items and subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecipeShortResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeShortResponse {
    pub fn new(recipe: &recipe::Model, media: &MediaStorage) -> Self {
        RecipeShortResponse {
            id: recipe.id,
            name: recipe.name.clone(),
            image: media.url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct IngredientAmountRequest {
    /// Ingredient id.
    pub id: i32,
    #[validate(range(
        min = 1,
        max = 10_000,
        message = "Amount must be between 1 and 10000."
    ))]
    pub amount: i32,
}

/// Flat write shape accepted by create (POST) and update (PATCH).
///
/// `validate()` covers the fields present in the body; which fields are required
/// and whether ids exist is decided in `services::recipe_validation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecipeWriteRequest {
    #[validate(nested)]
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
    /// Tag ids.
    pub tags: Option<Vec<i32>>,
    /// Base64 data URI, e.g. `data:image/png;base64,...`
    pub image: Option<String>,
    #[validate(
        custom(function = "crate::services::not_blank"),
        length(
            max = 256,
            message = "Ensure this field has no more than 256 characters."
        )
    )]
    pub name: Option<String>,
    #[validate(custom(function = "crate::services::not_blank"))]
    pub text: Option<String>,
    #[validate(range(
        min = 1,
        max = 32_000,
        message = "Cooking time must be between 1 and 32000 minutes."
    ))]
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}
