use super::memberships::member_recipes;
use crate::pagination::{self, PageRequest};
use crate::entities::{
    favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag,
};
use crate::services::membership::Membership;
use crate::services::shopping_list::CartLine;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select, Set, TransactionTrait,
};
use std::collections::HashMap;

/// Recipe list filters. Membership filters are only set for authenticated callers.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    /// Any-of match on tag slugs; unknown slugs match nothing.
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
}

pub struct RecipeFields {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
}

/// Scalar changes of a partial update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
}

fn newest_first(query: Select<recipe::Entity>) -> Select<recipe::Entity> {
    query
        .order_by_desc(recipe::Column::PubDate)
        .order_by_desc(recipe::Column::Id)
}

fn filtered(filter: &RecipeFilter) -> Select<recipe::Entity> {
    let mut query = recipe::Entity::find();

    if let Some(author) = filter.author {
        query = query.filter(recipe::Column::AuthorId.eq(author));
    }
    if !filter.tag_slugs.is_empty() {
        let tagged = Query::select()
            .column((recipe_tag::Entity, recipe_tag::Column::RecipeId))
            .from(recipe_tag::Entity)
            .inner_join(
                tag::Entity,
                Expr::col((tag::Entity, tag::Column::Id))
                    .equals((recipe_tag::Entity, recipe_tag::Column::TagId)),
            )
            .and_where(tag::Column::Slug.is_in(filter.tag_slugs.iter().cloned()))
            .to_owned();
        query = query.filter(recipe::Column::Id.in_subquery(tagged));
    }
    if let Some(user_id) = filter.favorited_by {
        query = query.filter(
            recipe::Column::Id.in_subquery(member_recipes(Membership::Favorite, user_id)),
        );
    }
    if let Some(user_id) = filter.in_cart_of {
        query = query.filter(
            recipe::Column::Id.in_subquery(member_recipes(Membership::ShoppingCart, user_id)),
        );
    }

    newest_first(query)
}

/// One page of recipes, newest first, plus the total number of matches.
pub async fn page<C: ConnectionTrait>(
    db: &C,
    filter: &RecipeFilter,
    request: &PageRequest,
) -> Result<(Vec<recipe::Model>, u64), DbErr> {
    pagination::fetch(filtered(filter).paginate(db, request.size), request).await
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<recipe::Model>, DbErr> {
    recipe::Entity::find_by_id(id).one(db).await
}

async fn attach_children<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredients: &[(i32, i32)],
    tags: &[i32],
) -> Result<(), DbErr> {
    if !tags.is_empty() {
        recipe_tag::Entity::insert_many(tags.iter().map(|tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
            ..Default::default()
        }))
        .exec_without_returning(db)
        .await?;
    }
    if !ingredients.is_empty() {
        recipe_ingredient::Entity::insert_many(ingredients.iter().map(
            |(ingredient_id, amount)| recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(*ingredient_id),
                amount: Set(*amount),
                ..Default::default()
            },
        ))
        .exec_without_returning(db)
        .await?;
    }
    Ok(())
}

async fn detach_children<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<(), DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Creates the recipe with its tag links and ingredient rows in one transaction.
pub async fn create(
    db: &DatabaseConnection,
    author_id: i32,
    fields: RecipeFields,
    ingredients: &[(i32, i32)],
    tags: &[i32],
) -> Result<recipe::Model, DbErr> {
    let txn = db.begin().await?;

    let created = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(fields.name),
        text: Set(fields.text),
        image: Set(fields.image),
        cooking_time: Set(fields.cooking_time),
        pub_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    attach_children(&txn, created.id, ingredients, tags).await?;

    txn.commit().await?;
    Ok(created)
}

/// Applies scalar changes and replaces the tag and ingredient sets in one transaction.
pub async fn update(
    db: &DatabaseConnection,
    existing: recipe::Model,
    changes: RecipeChanges,
    ingredients: &[(i32, i32)],
    tags: &[i32],
) -> Result<recipe::Model, DbErr> {
    let txn = db.begin().await?;
    let recipe_id = existing.id;

    let mut active: recipe::ActiveModel = existing.clone().into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(text) = changes.text {
        active.text = Set(text);
    }
    if let Some(image) = changes.image {
        active.image = Set(image);
    }
    if let Some(cooking_time) = changes.cooking_time {
        active.cooking_time = Set(cooking_time);
    }
    let updated = if active.is_changed() {
        active.update(&txn).await?
    } else {
        existing
    };

    detach_children(&txn, recipe_id).await?;
    attach_children(&txn, recipe_id, ingredients, tags).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes the recipe together with everything that references it.
pub async fn delete(db: &DatabaseConnection, recipe_id: i32) -> Result<(), DbErr> {
    let txn = db.begin().await?;

    detach_children(&txn, recipe_id).await?;
    favorite::Entity::delete_many()
        .filter(favorite::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    shopping_cart::Entity::delete_many()
        .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe::Entity::delete_by_id(recipe_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Tags of each recipe, ordered by tag name.
pub async fn tags_for<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<tag::Model>>, DbErr> {
    let mut by_recipe: HashMap<i32, Vec<tag::Model>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(by_recipe);
    }

    let rows = recipe_tag::Entity::find()
        .find_also_related(tag::Entity)
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?;
    for (link, tag) in rows {
        if let Some(tag) = tag {
            by_recipe.entry(link.recipe_id).or_default().push(tag);
        }
    }
    Ok(by_recipe)
}

/// `(amount row, ingredient)` pairs of each recipe, in insertion order.
pub async fn ingredients_for<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<(recipe_ingredient::Model, ingredient::Model)>>, DbErr> {
    let mut by_recipe: HashMap<i32, Vec<_>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(by_recipe);
    }

    let rows = recipe_ingredient::Entity::find()
        .find_also_related(ingredient::Entity)
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(recipe_ingredient::Column::Id)
        .all(db)
        .await?;
    for (row, ingredient) in rows {
        if let Some(ingredient) = ingredient {
            by_recipe.entry(row.recipe_id).or_default().push((row, ingredient));
        }
    }
    Ok(by_recipe)
}

/// Newest recipes of one author, at most `limit` when given.
pub async fn by_author<C: ConnectionTrait>(
    db: &C,
    author_id: i32,
    limit: Option<u64>,
) -> Result<Vec<recipe::Model>, DbErr> {
    let mut query = newest_first(
        recipe::Entity::find().filter(recipe::Column::AuthorId.eq(author_id)),
    );
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query.all(db).await
}

#[derive(Debug, FromQueryResult)]
struct AuthorRecipeCount {
    author_id: i32,
    recipes: i64,
}

pub async fn count_by_author<C: ConnectionTrait>(
    db: &C,
    author_ids: &[i32],
) -> Result<HashMap<i32, u64>, DbErr> {
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let counts = recipe::Entity::find()
        .select_only()
        .column(recipe::Column::AuthorId)
        .column_as(recipe::Column::Id.count(), "recipes")
        .filter(recipe::Column::AuthorId.is_in(author_ids.iter().copied()))
        .group_by(recipe::Column::AuthorId)
        .into_model::<AuthorRecipeCount>()
        .all(db)
        .await?;
    Ok(counts
        .into_iter()
        .map(|row| (row.author_id, u64::try_from(row.recipes).unwrap_or(0)))
        .collect())
}

/// Every ingredient row of every recipe in the user's cart.
pub async fn cart_lines<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<CartLine>, DbErr> {
    recipe_ingredient::Entity::find()
        .select_only()
        .column_as(ingredient::Column::Name, "name")
        .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
        .column_as(recipe_ingredient::Column::Amount, "amount")
        .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
        .filter(
            recipe_ingredient::Column::RecipeId
                .in_subquery(member_recipes(Membership::ShoppingCart, user_id)),
        )
        .into_model::<CartLine>()
        .all(db)
        .await
}
