//! Row types read straight out of SQLite.
//! Distinct from warbler-types API models to keep the DB layer independent.

use std::fmt;

#[derive(Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
    pub created_at: String,
}

// Hand-written so the stored credential stays out of logs.
impl fmt::Debug for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("image_url", &self.image_url)
            .field("header_image_url", &self.header_image_url)
            .field("bio", &self.bio)
            .field("location", &self.location)
            .field("password", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// A message joined with its author's username and avatar.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub text: String,
    pub timestamp: String,
    pub user_id: String,
    pub author_username: String,
    pub author_image_url: String,
}

/// A home-timeline entry: the message plus whether the viewer likes it.
#[derive(Debug, Clone)]
pub struct TimelineRow {
    pub message: MessageRow,
    pub liked: bool,
}

#[derive(Debug, Clone)]
pub struct FollowRow {
    pub follower_id: String,
    pub followed_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct LikeRow {
    pub id: String,
    pub user_id: String,
    pub message_id: String,
    pub created_at: String,
}

/// Counts shown on a profile header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStatsRow {
    pub messages: u64,
    pub following: u64,
    pub followers: u64,
    pub likes: u64,
}

/// Editable profile fields. Blank image URLs reset to the defaults.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub image_url: Option<&'a str>,
    pub header_image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}
