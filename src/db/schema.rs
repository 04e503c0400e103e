use crate::entities::{
    favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, subscription, tag,
    user,
};
use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};

fn unique_pair<E: EntityTrait>(name: &str, a: E::Column, b: E::Column) -> IndexCreateStatement {
    Index::create().name(name).col(a).col(b).unique().to_owned()
}

fn table<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned()
}

/// Tables in foreign-key order, with the composite unique constraints inline.
fn tables(schema: &Schema) -> Vec<TableCreateStatement> {
    vec![
        table(schema, user::Entity),
        table(schema, subscription::Entity)
            .index(&mut unique_pair::<subscription::Entity>(
                "uq_subscription_follower_author",
                subscription::Column::FollowerId,
                subscription::Column::AuthorId,
            ))
            .to_owned(),
        table(schema, ingredient::Entity)
            .index(&mut unique_pair::<ingredient::Entity>(
                "uq_ingredient_name_unit",
                ingredient::Column::Name,
                ingredient::Column::MeasurementUnit,
            ))
            .to_owned(),
        table(schema, tag::Entity),
        table(schema, recipe::Entity),
        table(schema, recipe_ingredient::Entity),
        table(schema, recipe_tag::Entity)
            .index(&mut unique_pair::<recipe_tag::Entity>(
                "uq_recipe_tag",
                recipe_tag::Column::RecipeId,
                recipe_tag::Column::TagId,
            ))
            .to_owned(),
        table(schema, favorite::Entity)
            .index(&mut unique_pair::<favorite::Entity>(
                "uq_favorite_user_recipe",
                favorite::Column::UserId,
                favorite::Column::RecipeId,
            ))
            .to_owned(),
        table(schema, shopping_cart::Entity)
            .index(&mut unique_pair::<shopping_cart::Entity>(
                "uq_shopping_cart_user_recipe",
                shopping_cart::Column::UserId,
                shopping_cart::Column::RecipeId,
            ))
            .to_owned(),
    ]
}

pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    for statement in tables(&schema) {
        db.execute(backend.build(&statement)).await?;
    }
    Ok(())
}
