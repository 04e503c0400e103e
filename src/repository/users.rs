use crate::entities::{subscription, user};
use crate::pagination::{self, PageRequest};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashSet;

pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(id).one(db).await
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

/// Names of the unique fields of `new` that another user already holds.
pub async fn find_taken<C: ConnectionTrait>(
    db: &C,
    new: &NewUser,
) -> Result<Vec<&'static str>, DbErr> {
    let clashing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(new.email.as_str()))
                .add(user::Column::Username.eq(new.username.as_str()))
                .add(user::Column::FirstName.eq(new.first_name.as_str()))
                .add(user::Column::LastName.eq(new.last_name.as_str())),
        )
        .all(db)
        .await?;

    let mut taken = Vec::new();
    if clashing.iter().any(|u| u.email == new.email) {
        taken.push("email");
    }
    if clashing.iter().any(|u| u.username == new.username) {
        taken.push("username");
    }
    if clashing.iter().any(|u| u.first_name == new.first_name) {
        taken.push("first_name");
    }
    if clashing.iter().any(|u| u.last_name == new.last_name) {
        taken.push("last_name");
    }
    Ok(taken)
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewUser) -> Result<user::Model, DbErr> {
    user::ActiveModel {
        email: Set(new.email),
        username: Set(new.username),
        first_name: Set(new.first_name),
        last_name: Set(new.last_name),
        avatar: Set(None),
        password_hash: Set(new.password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Users ordered by username; returns the page and the total count.
pub async fn page<C: ConnectionTrait>(
    db: &C,
    request: &PageRequest,
) -> Result<(Vec<user::Model>, u64), DbErr> {
    let paginator = user::Entity::find()
        .order_by_asc(user::Column::Username)
        .paginate(db, request.size);
    pagination::fetch(paginator, request).await
}

pub async fn set_avatar<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    avatar: Option<String>,
) -> Result<user::Model, DbErr> {
    let mut active: user::ActiveModel = user.into();
    active.avatar = Set(avatar);
    active.update(db).await
}

pub async fn set_password_hash<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    password_hash: String,
) -> Result<user::Model, DbErr> {
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.update(db).await
}

/// Which of `author_ids` the follower is subscribed to.
pub async fn subscribed_author_ids<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    author_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<i32> = subscription::Entity::find()
        .select_only()
        .column(subscription::Column::AuthorId)
        .filter(subscription::Column::FollowerId.eq(follower_id))
        .filter(subscription::Column::AuthorId.is_in(author_ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Authors followed by `follower_id`, ordered by username.
pub async fn followed_authors_page<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    request: &PageRequest,
) -> Result<(Vec<user::Model>, u64), DbErr> {
    let followed = sea_orm::sea_query::Query::select()
        .column(subscription::Column::AuthorId)
        .from(subscription::Entity)
        .and_where(subscription::Column::FollowerId.eq(follower_id))
        .to_owned();

    let paginator = user::Entity::find()
        .filter(user::Column::Id.in_subquery(followed))
        .order_by_asc(user::Column::Username)
        .paginate(db, request.size);
    pagination::fetch(paginator, request).await
}
