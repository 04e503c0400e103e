pub const MAX_INGREDIENT_NAME_LENGTH: usize = 128;
pub const MAX_MEASUREMENT_UNIT_LENGTH: usize = 64;
pub const MAX_TAG_NAME_LENGTH: usize = 32;
pub const MAX_TAG_SLUG_LENGTH: usize = 32;

pub const DEFAULT_PAGE_SIZE: u64 = 6;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Reserved for the `/users/me/` route.
pub const RESERVED_USERNAME: &str = "me";
