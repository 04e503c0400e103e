//! "User marks recipe as X" relationships: favorites and shopping cart items.
//!
//! Both kinds share one add/remove implementation parameterized by
//! [`Membership`]. Duplicate detection relies on the store's unique
//! constraint, so concurrent adds cannot produce two rows.

use crate::entities::recipe;
use crate::errors::{ApiError, ApiResult};
use crate::services::InsertOutcome;
use async_trait::async_trait;
use sea_orm::DbErr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Favorite,
    ShoppingCart,
}

impl Membership {
    fn duplicate_message(self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is already in favorites.",
            Membership::ShoppingCart => "Recipe is already in the shopping cart.",
        }
    }

    fn missing_message(self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is not in favorites.",
            Membership::ShoppingCart => "Recipe is not in the shopping cart.",
        }
    }
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn recipe(&self, recipe_id: i32) -> Result<Option<recipe::Model>, DbErr>;

    async fn insert_membership(
        &self,
        kind: Membership,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<InsertOutcome, DbErr>;

    /// Returns the number of deleted rows.
    async fn delete_membership(
        &self,
        kind: Membership,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<u64, DbErr>;
}

fn recipe_not_found() -> ApiError {
    ApiError::not_found("Recipe with the given id was not found.")
}

/// Adds the recipe to the user's `kind` list and returns the recipe.
pub async fn add<S: MembershipStore + ?Sized>(
    store: &S,
    kind: Membership,
    user_id: i32,
    recipe_id: i32,
) -> ApiResult<recipe::Model> {
    let recipe = store
        .recipe(recipe_id)
        .await?
        .ok_or_else(recipe_not_found)?;

    match store.insert_membership(kind, user_id, recipe_id).await? {
        InsertOutcome::Inserted => {
            log::info!("User {} added recipe {} to {:?}", user_id, recipe_id, kind);
            Ok(recipe)
        }
        InsertOutcome::Duplicate => Err(ApiError::Conflict(kind.duplicate_message().to_string())),
    }
}

pub async fn remove<S: MembershipStore + ?Sized>(
    store: &S,
    kind: Membership,
    user_id: i32,
    recipe_id: i32,
) -> ApiResult<()> {
    if store.recipe(recipe_id).await?.is_none() {
        return Err(recipe_not_found());
    }

    if store.delete_membership(kind, user_id, recipe_id).await? == 0 {
        return Err(ApiError::bad_request(kind.missing_message()));
    }
    log::info!("User {} removed recipe {} from {:?}", user_id, recipe_id, kind);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct MemoryStore {
        recipes: HashSet<i32>,
        rows: Mutex<HashSet<(Membership, i32, i32)>>,
    }

    impl MemoryStore {
        fn with_recipes(ids: &[i32]) -> Self {
            MemoryStore {
                recipes: ids.iter().copied().collect(),
                rows: Mutex::new(HashSet::new()),
            }
        }

        fn count(&self, kind: Membership) -> usize {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _, _)| *k == kind)
                .count()
        }
    }

    #[async_trait]
    impl MembershipStore for MemoryStore {
        async fn recipe(&self, recipe_id: i32) -> Result<Option<recipe::Model>, DbErr> {
            Ok(self.recipes.contains(&recipe_id).then(|| recipe::Model {
                id: recipe_id,
                author_id: 1,
                name: format!("recipe {}", recipe_id),
                text: "text".to_string(),
                image: "recipes/images/a.png".to_string(),
                cooking_time: 10,
                pub_date: Utc::now(),
            }))
        }

        async fn insert_membership(
            &self,
            kind: Membership,
            user_id: i32,
            recipe_id: i32,
        ) -> Result<InsertOutcome, DbErr> {
            let inserted = self.rows.lock().unwrap().insert((kind, user_id, recipe_id));
            Ok(if inserted {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::Duplicate
            })
        }

        async fn delete_membership(
            &self,
            kind: Membership,
            user_id: i32,
            recipe_id: i32,
        ) -> Result<u64, DbErr> {
            let removed = self.rows.lock().unwrap().remove(&(kind, user_id, recipe_id));
            Ok(u64::from(removed))
        }
    }

    #[actix_web::test]
    async fn add_returns_the_recipe() {
        let store = MemoryStore::with_recipes(&[7]);
        let recipe = add(&store, Membership::Favorite, 1, 7).await.unwrap();
        assert_eq!(recipe.id, 7);
        assert_eq!(store.count(Membership::Favorite), 1);
    }

    #[actix_web::test]
    async fn repeated_adds_conflict_and_keep_one_row() {
        let store = MemoryStore::with_recipes(&[7]);
        add(&store, Membership::ShoppingCart, 1, 7).await.unwrap();
        for _ in 0..3 {
            let err = add(&store, Membership::ShoppingCart, 1, 7).await.unwrap_err();
            assert!(matches!(err, ApiError::Conflict(_)));
        }
        assert_eq!(store.count(Membership::ShoppingCart), 1);
    }

    #[actix_web::test]
    async fn kinds_are_independent() {
        let store = MemoryStore::with_recipes(&[7]);
        add(&store, Membership::Favorite, 1, 7).await.unwrap();
        add(&store, Membership::ShoppingCart, 1, 7).await.unwrap();
        add(&store, Membership::Favorite, 2, 7).await.unwrap();
        assert_eq!(store.count(Membership::Favorite), 2);
        assert_eq!(store.count(Membership::ShoppingCart), 1);
    }

    #[actix_web::test]
    async fn unknown_recipe_is_not_found() {
        let store = MemoryStore::with_recipes(&[]);
        assert!(matches!(
            add(&store, Membership::Favorite, 1, 99).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            remove(&store, Membership::Favorite, 1, 99).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn removing_a_never_added_pair_is_a_bad_request() {
        let store = MemoryStore::with_recipes(&[7]);
        let err = remove(&store, Membership::Favorite, 1, 7).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[actix_web::test]
    async fn remove_deletes_the_row() {
        let store = MemoryStore::with_recipes(&[7]);
        add(&store, Membership::Favorite, 1, 7).await.unwrap();
        remove(&store, Membership::Favorite, 1, 7).await.unwrap();
        assert_eq!(store.count(Membership::Favorite), 0);
        assert!(remove(&store, Membership::Favorite, 1, 7).await.is_err());
    }
}
