//! Navigation targets.

use serde::{Deserialize, Serialize};

/// Application routes a flow can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    Login,
    SignUp,
    EditProfile,
}

impl Route {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::SignUp => "/signup",
            Self::EditProfile => "/edit-profile",
        }
    }
}
