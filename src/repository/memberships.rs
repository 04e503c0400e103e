use super::insert_outcome;
use crate::entities::{favorite, recipe, shopping_cart};
use crate::services::membership::{Membership, MembershipStore};
use crate::services::InsertOutcome;
use async_trait::async_trait;
use sea_orm::sea_query::{Query, SelectStatement};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
    Set,
};
use std::collections::HashSet;

/// `SELECT recipe_id FROM <kind table> WHERE user_id = ?`, for use as a subquery.
pub fn member_recipes(kind: Membership, user_id: i32) -> SelectStatement {
    match kind {
        Membership::Favorite => Query::select()
            .column(favorite::Column::RecipeId)
            .from(favorite::Entity)
            .and_where(favorite::Column::UserId.eq(user_id))
            .to_owned(),
        Membership::ShoppingCart => Query::select()
            .column(shopping_cart::Column::RecipeId)
            .from(shopping_cart::Entity)
            .and_where(shopping_cart::Column::UserId.eq(user_id))
            .to_owned(),
    }
}

/// Which of `recipe_ids` the user holds in `kind`.
pub async fn recipe_ids_with<C: ConnectionTrait>(
    db: &C,
    kind: Membership,
    user_id: i32,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<i32> = match kind {
        Membership::Favorite => {
            favorite::Entity::find()
                .select_only()
                .column(favorite::Column::RecipeId)
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .into_tuple()
                .all(db)
                .await?
        }
        Membership::ShoppingCart => {
            shopping_cart::Entity::find()
                .select_only()
                .column(shopping_cart::Column::RecipeId)
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .into_tuple()
                .all(db)
                .await?
        }
    };
    Ok(ids.into_iter().collect())
}

#[async_trait]
impl MembershipStore for DatabaseConnection {
    async fn recipe(&self, recipe_id: i32) -> Result<Option<recipe::Model>, DbErr> {
        recipe::Entity::find_by_id(recipe_id).one(self).await
    }

    async fn insert_membership(
        &self,
        kind: Membership,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<InsertOutcome, DbErr> {
        match kind {
            Membership::Favorite => insert_outcome(
                favorite::Entity::insert(favorite::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    ..Default::default()
                })
                .exec_without_returning(self)
                .await,
            ),
            Membership::ShoppingCart => insert_outcome(
                shopping_cart::Entity::insert(shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    ..Default::default()
                })
                .exec_without_returning(self)
                .await,
            ),
        }
    }

    async fn delete_membership(
        &self,
        kind: Membership,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<u64, DbErr> {
        let result = match kind {
            Membership::Favorite => {
                favorite::Entity::delete_many()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .exec(self)
                    .await?
            }
            Membership::ShoppingCart => {
                shopping_cart::Entity::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(self)
                    .await?
            }
        };
        Ok(result.rows_affected)
    }
}
