use crate::entities::{ingredient, tag};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(tag: tag::Model) -> Self {
        TagResponse {
            id: tag.id,
            name: tag.name,
            slug: tag.slug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(ingredient: ingredient::Model) -> Self {
        IngredientResponse {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}
