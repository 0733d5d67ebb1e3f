use axum::{
    Extension, Json,
    extract::{Path, State},
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use warbler_types::api::LikesResponse;

use crate::auth::{AppState, blocking, found};
use crate::convert;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// POST /messages/{message_id}/like: like or unlike someone else's message.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(message_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let user = current.require()?;

    let mid = message_id.to_string();
    let message = blocking(&state, move |db| db.get_message(&mid))
        .await?
        .ok_or(ApiError::NotFound("message"))?;

    if message.user_id == user.id.to_string() {
        return Err(ApiError::Forbidden);
    }

    let uid = user.id.to_string();
    let liked = blocking(&state, move |db| db.toggle_like(&uid, &message.id)).await?;
    debug!("{} like on {} is now {}", user.username, message_id, liked);

    Ok(found("/"))
}

/// GET /users/{user_id}/likes
pub async fn show_likes(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<LikesResponse>, ApiError> {
    current.require()?;

    let uid = user_id.to_string();
    let (user, messages) = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_id(&uid)? else {
            return Ok(None);
        };
        let messages = db.liked_messages(&uid)?;
        Ok(Some((user, messages)))
    })
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(LikesResponse {
        user: convert::user(user),
        messages: convert::messages(messages),
    }))
}
