use super::insert_outcome;
use crate::entities::{subscription, user};
use crate::services::subscriptions::SubscriptionStore;
use crate::services::InsertOutcome;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

#[async_trait]
impl SubscriptionStore for DatabaseConnection {
    async fn user(&self, user_id: i32) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(user_id).one(self).await
    }

    async fn insert_subscription(
        &self,
        follower_id: i32,
        author_id: i32,
    ) -> Result<InsertOutcome, DbErr> {
        insert_outcome(
            subscription::Entity::insert(subscription::ActiveModel {
                follower_id: Set(follower_id),
                author_id: Set(author_id),
                ..Default::default()
            })
            .exec_without_returning(self)
            .await,
        )
    }

    async fn delete_subscription(&self, follower_id: i32, author_id: i32) -> Result<u64, DbErr> {
        let result = subscription::Entity::delete_many()
            .filter(subscription::Column::FollowerId.eq(follower_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .exec(self)
            .await?;
        Ok(result.rows_affected)
    }
}
