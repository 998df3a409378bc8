//! Natter Common Library
//!
//! Shared types and pure helpers used by the client flows and any view layer.

pub mod avatar;
pub mod error_codes;
pub mod routes;
pub mod types;
pub mod validation;

pub use avatar::{string_avatar, AvatarLabel};
pub use error_codes::message_for_code;
pub use routes::Route;
pub use types::*;
pub use validation::{validate_sign_up, PasswordPolicy};
