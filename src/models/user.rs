use crate::entities::user;
use crate::services::media::MediaStorage;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Field checks run through `validate()`; uniqueness needs storage and is checked by the handler.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[schema(example = "cook@example.com")]
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: String,
    #[schema(example = "cook")]
    #[validate(
        custom(function = "crate::services::user_validation::username_format"),
        length(max = 150, message = "Ensure this field has no more than 150 characters.")
    )]
    pub username: String,
    #[validate(
        custom(function = "crate::services::not_blank"),
        length(max = 150, message = "Ensure this field has no more than 150 characters.")
    )]
    pub first_name: String,
    #[validate(
        custom(function = "crate::services::not_blank"),
        length(max = 150, message = "Ensure this field has no more than 150 characters.")
    )]
    pub last_name: String,
    #[validate(custom(function = "crate::services::not_blank"))]
    pub password: String,
}

/// Returned by registration; carries no viewer-dependent fields.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedUserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for CreatedUserResponse {
    fn from(user: user::Model) -> Self {
        CreatedUserResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub auth_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserResponse {
    pub fn new(user: &user::Model, is_subscribed: bool, media: &MediaStorage) -> Self {
        UserResponse {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.as_deref().map(|path| media.url(path)),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvatarRequest {
    /// Base64 data URI, e.g. `data:image/png;base64,...`
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetPasswordRequest {
    pub current_password: String,
    #[validate(custom(function = "crate::services::not_blank"))]
    pub new_password: String,
}
