//! Tags and ingredients: read-only reference data seeded from fixtures.

use crate::entities::{ingredient, tag};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashSet;

pub async fn list_tags<C: ConnectionTrait>(db: &C) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
}

pub async fn find_tag<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<tag::Model>, DbErr> {
    tag::Entity::find_by_id(id).one(db).await
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Ingredients ordered by name, optionally filtered by a case-insensitive name prefix.
pub async fn list_ingredients<C: ConnectionTrait>(
    db: &C,
    name_prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut query = ingredient::Entity::find();
    if let Some(prefix) = name_prefix.filter(|p| !p.is_empty()) {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        query = query.filter(
            Expr::expr(Func::lower(Expr::col((
                ingredient::Entity,
                ingredient::Column::Name,
            ))))
            .like(LikeExpr::new(pattern).escape('\\')),
        );
    }
    query
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await
}

pub async fn find_ingredient<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<ingredient::Model>, DbErr> {
    ingredient::Entity::find_by_id(id).one(db).await
}

pub async fn existing_ingredient_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let found: Vec<i32> = ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Id)
        .filter(ingredient::Column::Id.is_in(ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(found.into_iter().collect())
}

pub async fn existing_tag_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let found: Vec<i32> = tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Id.is_in(ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(found.into_iter().collect())
}

/// Ids of tags carrying any of the given slugs.
pub async fn tag_ids_by_slugs<C: ConnectionTrait>(
    db: &C,
    slugs: &[String],
) -> Result<Vec<i32>, DbErr> {
    if slugs.is_empty() {
        return Ok(Vec::new());
    }
    tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Slug.is_in(slugs.iter().cloned()))
        .into_tuple()
        .all(db)
        .await
}

/// Inserts the ingredient unless the same (name, unit) pair exists. Returns whether a row was added.
pub async fn create_ingredient_if_missing<C: ConnectionTrait>(
    db: &C,
    name: &str,
    measurement_unit: &str,
) -> Result<bool, DbErr> {
    let exists = ingredient::Entity::find()
        .filter(ingredient::Column::Name.eq(name))
        .filter(ingredient::Column::MeasurementUnit.eq(measurement_unit))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(false);
    }
    ingredient::Entity::insert(ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(measurement_unit.to_string()),
        ..Default::default()
    })
    .exec_without_returning(db)
    .await?;
    Ok(true)
}

pub async fn create_tag_if_missing<C: ConnectionTrait>(
    db: &C,
    name: &str,
    slug: &str,
) -> Result<bool, DbErr> {
    let exists = tag::Entity::find()
        .filter(tag::Column::Slug.eq(slug))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(false);
    }
    tag::Entity::insert(tag::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    })
    .exec_without_returning(db)
    .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like("flour"), "flour");
    }
}
