use crate::constants::RESERVED_USERNAME;
use crate::errors::ValidationErrors;
use crate::models::SignupRequest;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.@+-]+\z").expect("USERNAME_REGEX: invalid regex pattern")
});

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Non-blank, not the reserved `me` in any case, and only word characters or `.@+-`.
pub fn username_format(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(invalid("blank", "This field may not be blank."));
    }
    if username.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(invalid(
            "reserved",
            format!("Username '{}' is not allowed.", username),
        ));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(invalid(
            "pattern",
            "Username may contain only letters, digits and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

/// Field-level checks; uniqueness is checked against storage by the caller.
pub fn validate_signup(request: &SignupRequest) -> ValidationErrors {
    match request.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str) -> SignupRequest {
        SignupRequest {
            email: "cook@example.com".to_string(),
            username: username.to_string(),
            first_name: "Julia".to_string(),
            last_name: "Child".to_string(),
            password: "s3cret-pass".to_string(),
        }
    }

    #[test]
    fn accepts_regular_usernames() {
        for name in ["cook", "julia.child", "a+b@c-d_e", "Повар"] {
            assert!(validate_signup(&signup(name)).is_empty(), "{}", name);
        }
    }

    #[test]
    fn reserved_username_rejected_in_any_case() {
        for name in ["me", "Me", "ME"] {
            assert!(validate_signup(&signup(name)).contains("username"));
        }
    }

    #[test]
    fn rejects_characters_outside_pattern() {
        for name in ["", "with space", "semi;colon", "slash/", "trailing\n"] {
            assert!(validate_signup(&signup(name)).contains("username"), "{:?}", name);
        }
    }

    #[test]
    fn enforces_lengths_and_email_shape() {
        let mut request = signup(&"u".repeat(151));
        request.email = "not-an-email".to_string();
        request.first_name = "f".repeat(151);
        request.last_name = "   ".to_string();
        request.password = String::new();

        let errors = validate_signup(&request);
        for field in ["username", "email", "first_name", "last_name", "password"] {
            assert!(errors.contains(field), "{}", field);
        }
        assert_eq!(errors.messages("email"), ["Enter a valid email address."]);
    }
}
