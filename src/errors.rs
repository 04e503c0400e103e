use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use validator::ValidationErrorsKind;

/// Field-keyed validation messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> Result<T, ApiError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl ValidationErrors {
    fn absorb(&mut self, field: &str, kind: &ValidationErrorsKind) {
        match kind {
            ValidationErrorsKind::Field(errors) => {
                for error in errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                    self.add(field, message);
                }
            }
            // Nested messages are reported under the outer field, e.g. `ingredients`.
            ValidationErrorsKind::Struct(inner) => {
                for nested in inner.errors().values() {
                    self.absorb(field, nested);
                }
            }
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    for nested in inner.errors().values() {
                        self.absorb(field, nested);
                    }
                }
            }
        }
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(source: validator::ValidationErrors) -> Self {
        let mut errors = ValidationErrors::new();
        for (field, kind) in source.errors() {
            errors.absorb(field, kind);
        }
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The request is well-formed but does not apply to the current state.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("You do not have permission to perform this action.".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Validation(errors) => HttpResponse::build(self.status_code()).json(errors),
            ApiError::Database(e) => {
                log::error!("Database error: {:?}", e);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
            ApiError::Internal(e) => {
                log::error!("Internal error: {:?}", e);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
            other => HttpResponse::build(self.status_code()).json(json!({
                "error": other.to_string()
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            ApiError::Validation(ValidationErrors::single("text", "required")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::bad_request("nothing to remove").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::unauthorized().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("gone").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("twice".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Database(DbErr::Custom("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_group_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add("tags", "first");
        errors.add("tags", "second");
        errors.add("image", "missing");

        assert!(errors.contains("tags"));
        assert_eq!(errors.messages("tags"), ["first", "second"]);
        assert!(errors.messages("name").is_empty());
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"image": ["missing"], "tags": ["first", "second"]})
        );
    }

    #[test]
    fn validator_errors_keep_field_and_message() {
        let mut source = validator::ValidationErrors::new();
        source.add(
            "name",
            validator::ValidationError::new("length").with_message("Too long.".into()),
        );
        source.add("email", validator::ValidationError::new("email"));

        let errors = ValidationErrors::from(source);
        assert_eq!(errors.messages("name"), ["Too long."]);
        assert_eq!(errors.messages("email"), ["Invalid value (email)."]);
    }

    #[test]
    fn empty_validation_errors_pass_value_through() {
        assert_eq!(ValidationErrors::new().into_result(5).unwrap(), 5);
        assert!(ValidationErrors::single("name", "bad")
            .into_result(())
            .is_err());
    }
}
