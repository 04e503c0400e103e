//! Startup seeding of tags and ingredients from JSON files.
//!
//! Ingredients: `[{"name": "flour", "measurement_unit": "g"}, ...]`
//! Tags: `[{"name": "Breakfast", "slug": "breakfast"}, ...]`

use crate::config::FixturesConfig;
use crate::constants::{
    MAX_INGREDIENT_NAME_LENGTH, MAX_MEASUREMENT_UNIT_LENGTH, MAX_TAG_NAME_LENGTH,
    MAX_TAG_SLUG_LENGTH,
};
use crate::repository::catalog;
use anyhow::Context;
use sea_orm::ConnectionTrait;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct IngredientFixture {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Deserialize)]
pub struct TagFixture {
    pub name: String,
    pub slug: String,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, anyhow::Error> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing fixture {}", path.display()))
}

pub async fn load_ingredients<C: ConnectionTrait>(
    db: &C,
    items: &[IngredientFixture],
) -> Result<usize, anyhow::Error> {
    let mut added = 0;
    for item in items {
        if item.name.chars().count() > MAX_INGREDIENT_NAME_LENGTH
            || item.measurement_unit.chars().count() > MAX_MEASUREMENT_UNIT_LENGTH
        {
            log::warn!("Skipping ingredient fixture {:?}: too long", item.name);
            continue;
        }
        if catalog::create_ingredient_if_missing(db, &item.name, &item.measurement_unit).await? {
            added += 1;
        }
    }
    Ok(added)
}

pub async fn load_tags<C: ConnectionTrait>(
    db: &C,
    items: &[TagFixture],
) -> Result<usize, anyhow::Error> {
    let mut added = 0;
    for item in items {
        if item.name.chars().count() > MAX_TAG_NAME_LENGTH
            || item.slug.chars().count() > MAX_TAG_SLUG_LENGTH
        {
            log::warn!("Skipping tag fixture {:?}: too long", item.name);
            continue;
        }
        if catalog::create_tag_if_missing(db, &item.name, &item.slug).await? {
            added += 1;
        }
    }
    Ok(added)
}

/// Loads the configured fixture files; rows that already exist are skipped.
pub async fn load<C: ConnectionTrait>(db: &C, config: &FixturesConfig) -> Result<(), anyhow::Error> {
    if let Some(path) = &config.ingredients {
        let items: Vec<IngredientFixture> = read_json(path)?;
        let added = load_ingredients(db, &items).await?;
        log::info!("Loaded {} of {} ingredients from {}", added, items.len(), path.display());
    }
    if let Some(path) = &config.tags {
        let items: Vec<TagFixture> = read_json(path)?;
        let added = load_tags(db, &items).await?;
        log::info!("Loaded {} of {} tags from {}", added, items.len(), path.display());
    }
    Ok(())
}
