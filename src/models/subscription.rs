use crate::models::{RecipeShortResponse, UserResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A followed author together with (a prefix of) their recipes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: u64,
}
