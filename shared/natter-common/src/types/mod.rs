//! Domain Types

mod signup;
mod user;

pub use signup::*;
pub use user::*;
