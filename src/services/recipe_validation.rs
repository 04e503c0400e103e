use crate::errors::ValidationErrors;
use crate::models::RecipeWriteRequest;
use crate::services::media::{decode_data_uri, DecodedImage};
use std::collections::HashSet;
use validator::Validate;

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Ingredient and tag ids from the request that exist in storage.
#[derive(Debug, Clone, Default)]
pub struct KnownIds {
    pub ingredients: HashSet<i32>,
    pub tags: HashSet<i32>,
}

/// A write request that passed validation. Scalars are always present on
/// create; on update `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct ValidRecipe {
    /// `(ingredient_id, amount)` in submission order.
    pub ingredients: Vec<(i32, i32)>,
    pub tags: Vec<i32>,
    pub image: Option<DecodedImage>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

pub fn validate(
    request: &RecipeWriteRequest,
    mode: Mode,
    known: &KnownIds,
) -> Result<ValidRecipe, ValidationErrors> {
    let mut errors = match request.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => ValidationErrors::from(errors),
    };

    let ingredients = check_ingredients(request, known, &mut errors);
    let tags = check_tags(request, known, &mut errors);

    if mode == Mode::Create {
        for (field, present) in [
            ("name", request.name.is_some()),
            ("text", request.text.is_some()),
            ("cooking_time", request.cooking_time.is_some()),
        ] {
            if !present {
                errors.add(field, REQUIRED);
            }
        }
    }

    let image = match request.image.as_deref() {
        None if mode == Mode::Create => {
            errors.add("image", REQUIRED);
            None
        }
        None => None,
        Some(data) => match decode_data_uri(data) {
            Ok(image) => Some(image),
            Err(message) => {
                errors.add("image", message);
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidRecipe {
        ingredients,
        tags,
        image,
        name: request.name.as_deref().map(|name| name.trim().to_string()),
        text: request.text.clone(),
        cooking_time: request.cooking_time,
    })
}

fn check_ingredients(
    request: &RecipeWriteRequest,
    known: &KnownIds,
    errors: &mut ValidationErrors,
) -> Vec<(i32, i32)> {
    let Some(items) = request.ingredients.as_ref() else {
        errors.add("ingredients", REQUIRED);
        return Vec::new();
    };
    if items.is_empty() {
        errors.add("ingredients", "At least one ingredient is required.");
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut duplicate = false;
    for item in items {
        if !seen.insert(item.id) {
            duplicate = true;
        }
        if !known.ingredients.contains(&item.id) {
            errors.add(
                "ingredients",
                format!("Ingredient with id {} does not exist.", item.id),
            );
        }
    }
    if duplicate {
        errors.add("ingredients", "Ingredients must not repeat.");
    }

    items.iter().map(|item| (item.id, item.amount)).collect()
}

fn check_tags(
    request: &RecipeWriteRequest,
    known: &KnownIds,
    errors: &mut ValidationErrors,
) -> Vec<i32> {
    let Some(tags) = request.tags.as_ref() else {
        errors.add("tags", REQUIRED);
        return Vec::new();
    };
    if tags.is_empty() {
        errors.add("tags", "At least one tag is required.");
        return Vec::new();
    }

    let unique: HashSet<i32> = tags.iter().copied().collect();
    if unique.len() != tags.len() {
        errors.add("tags", "Tags must not repeat.");
    }
    for id in tags {
        if !known.tags.contains(id) {
            errors.add("tags", format!("Tag with id {} does not exist.", id));
        }
    }

    tags.clone()
}
