use crate::entities::user;
use crate::errors::{ApiError, ApiResult, ValidationErrors};
use crate::services::InsertOutcome;
use async_trait::async_trait;
use sea_orm::DbErr;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn user(&self, user_id: i32) -> Result<Option<user::Model>, DbErr>;

    async fn insert_subscription(
        &self,
        follower_id: i32,
        author_id: i32,
    ) -> Result<InsertOutcome, DbErr>;

    /// Returns the number of deleted rows.
    async fn delete_subscription(&self, follower_id: i32, author_id: i32) -> Result<u64, DbErr>;
}

fn author_not_found() -> ApiError {
    ApiError::not_found("User with the given id was not found.")
}

/// Subscribes `follower_id` to `author_id` and returns the author.
pub async fn subscribe<S: SubscriptionStore + ?Sized>(
    store: &S,
    follower_id: i32,
    author_id: i32,
) -> ApiResult<user::Model> {
    let author = store
        .user(author_id)
        .await?
        .ok_or_else(author_not_found)?;

    if follower_id == author_id {
        return Err(ApiError::Validation(ValidationErrors::single(
            "author",
            "You cannot subscribe to yourself.",
        )));
    }

    match store.insert_subscription(follower_id, author_id).await? {
        InsertOutcome::Inserted => {
            log::info!("User {} subscribed to {}", follower_id, author_id);
            Ok(author)
        }
        InsertOutcome::Duplicate => Err(ApiError::Conflict(
            "You are already subscribed to this user.".to_string(),
        )),
    }
}

pub async fn unsubscribe<S: SubscriptionStore + ?Sized>(
    store: &S,
    follower_id: i32,
    author_id: i32,
) -> ApiResult<()> {
    if store.user(author_id).await?.is_none() {
        return Err(author_not_found());
    }

    if store.delete_subscription(follower_id, author_id).await? == 0 {
        return Err(ApiError::bad_request(
            "You are not subscribed to this user.",
        ));
    }
    log::info!("User {} unsubscribed from {}", follower_id, author_id);
    Ok(())
}

/// `recipes_limit` query value; absent or non-numeric means unlimited.
pub fn parse_recipes_limit(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
}
