use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, User, UserStats};

// -- Session --

/// Claims carried in the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Profile edit form. `password` confirms the change and is never stored.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserDetail {
    pub user: User,
    pub stats: UserStats,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserList {
    pub user: User,
    pub users: Vec<User>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub message: Message,
    pub liked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub user: Option<User>,
    pub stats: Option<UserStats>,
    pub messages: Vec<TimelineEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikesResponse {
    pub user: User,
    pub messages: Vec<Message>,
}
