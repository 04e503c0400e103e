//! Assembles read shapes from entity rows, batching the per-viewer lookups.

use crate::entities::{recipe, user};
use crate::models::{
    RecipeIngredientResponse, RecipeResponse, RecipeShortResponse, SubscriptionResponse,
    TagResponse, UserResponse,
};
use crate::repository::{memberships, recipes as recipe_repo, users as user_repo};
use crate::services::media::MediaStorage;
use crate::services::membership::Membership;
use sea_orm::{ColumnTrait, DbErr, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::{HashMap, HashSet};

pub async fn users(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: Option<i32>,
    models: &[user::Model],
) -> Result<Vec<UserResponse>, DbErr> {
    let ids: Vec<i32> = models.iter().map(|u| u.id).collect();
    let subscribed = match viewer {
        Some(viewer) => user_repo::subscribed_author_ids(db, viewer, &ids).await?,
        None => HashSet::new(),
    };
    Ok(models
        .iter()
        .map(|u| UserResponse::new(u, subscribed.contains(&u.id), media))
        .collect())
}

pub async fn user(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: Option<i32>,
    model: &user::Model,
) -> Result<UserResponse, DbErr> {
    let mut shaped = users(db, media, viewer, std::slice::from_ref(model)).await?;
    Ok(shaped.remove(0))
}

pub async fn recipes(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: Option<i32>,
    models: Vec<recipe::Model>,
) -> Result<Vec<RecipeResponse>, DbErr> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = models.iter().map(|r| r.id).collect();

    let mut author_ids: Vec<i32> = models.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let author_models = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?;
    let authors: HashMap<i32, UserResponse> = users(db, media, viewer, &author_models)
        .await?
        .into_iter()
        .map(|author| (author.id, author))
        .collect();

    let mut tags = recipe_repo::tags_for(db, &ids).await?;
    let mut ingredients = recipe_repo::ingredients_for(db, &ids).await?;
    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            memberships::recipe_ids_with(db, Membership::Favorite, viewer, &ids).await?,
            memberships::recipe_ids_with(db, Membership::ShoppingCart, viewer, &ids).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    let mut shaped = Vec::with_capacity(models.len());
    for model in models {
        let author = authors
            .get(&model.author_id)
            .cloned()
            .ok_or_else(|| DbErr::RecordNotFound(format!("author {}", model.author_id)))?;
        shaped.push(RecipeResponse {
            id: model.id,
            tags: tags
                .remove(&model.id)
                .unwrap_or_default()
                .into_iter()
                .map(TagResponse::from)
                .collect(),
            author,
            ingredients: ingredients
                .remove(&model.id)
                .unwrap_or_default()
                .into_iter()
                .map(|(row, ingredient)| RecipeIngredientResponse {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: row.amount,
                })
                .collect(),
            is_favorited: favorited.contains(&model.id),
            is_in_shopping_cart: in_cart.contains(&model.id),
            image: media.url(&model.image),
            name: model.name,
            text: model.text,
            cooking_time: model.cooking_time,
        });
    }
    Ok(shaped)
}

pub async fn recipe(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: Option<i32>,
    model: recipe::Model,
) -> Result<RecipeResponse, DbErr> {
    let mut shaped = recipes(db, media, viewer, vec![model]).await?;
    Ok(shaped.remove(0))
}

/// Followed authors with their newest recipes, truncated to `recipes_limit`.
pub async fn subscriptions(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: i32,
    authors: &[user::Model],
    recipes_limit: Option<u64>,
) -> Result<Vec<SubscriptionResponse>, DbErr> {
    let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
    let counts = recipe_repo::count_by_author(db, &ids).await?;
    let shaped_authors = users(db, media, Some(viewer), authors).await?;

    let mut shaped = Vec::with_capacity(authors.len());
    for author in shaped_authors {
        let recent = recipe_repo::by_author(db, author.id, recipes_limit).await?;
        shaped.push(SubscriptionResponse {
            recipes: recent
                .iter()
                .map(|r| RecipeShortResponse::new(r, media))
                .collect(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
            author,
        });
    }
    Ok(shaped)
}
