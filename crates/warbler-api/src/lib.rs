pub mod auth;
pub mod convert;
pub mod error;
pub mod likes;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod users;

pub use error::ApiError;
