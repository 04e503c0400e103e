pub mod catalog;
pub mod recipe;
pub mod subscription;
pub mod user;

pub use catalog::*;
pub use recipe::*;
pub use subscription::*;
pub use user::*;
