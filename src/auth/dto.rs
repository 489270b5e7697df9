use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Profile, Role};

/// Request body for sign-up. `full_name` and `role` become profile metadata.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// First view shown after sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingView {
    Dashboard,
    MyClasses,
    Events,
}

impl LandingView {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Teacher => LandingView::MyClasses,
            Role::Editor => LandingView::Events,
            _ => LandingView::Dashboard,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub profile: Profile,
    pub landing_view: LandingView,
    /// True when the profile was missing and had to be created on this call.
    pub repaired: bool,
}
