pub mod media;
pub mod membership;
pub mod recipe_validation;
pub mod shopping_list;
pub mod subscriptions;
pub mod user_validation;

use validator::ValidationError;

/// Custom `validator` check for text fields that must contain more than whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(
            ValidationError::new("blank").with_message("This field may not be blank.".into()),
        );
    }
    Ok(())
}

/// Result of an insert guarded by a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}
