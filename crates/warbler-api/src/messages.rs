use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::Response,
};
use tracing::info;
use uuid::Uuid;

use warbler_types::api::{HomeResponse, MessageForm};
use warbler_types::models::Message;

use crate::auth::{AppState, blocking, found};
use crate::convert;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// Messages shown on the home timeline.
const TIMELINE_LIMIT: u32 = 100;

/// GET /: the viewer's timeline, or an empty page for anonymous visitors.
pub async fn home(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<HomeResponse>, ApiError> {
    let Some(user) = current.0 else {
        return Ok(Json(HomeResponse {
            user: None,
            stats: None,
            messages: vec![],
        }));
    };

    let uid = user.id.to_string();
    let (stats, timeline) = blocking(&state, move |db| {
        let stats = db.user_stats(&uid)?;
        let timeline = db.home_timeline(&uid, TIMELINE_LIMIT)?;
        Ok((stats, timeline))
    })
    .await?;

    Ok(Json(HomeResponse {
        user: Some(user),
        stats: Some(convert::stats(stats)),
        messages: convert::timeline(timeline),
    }))
}

/// POST /messages/new
pub async fn create_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<MessageForm>,
) -> Result<Response, ApiError> {
    let user = current.require()?;

    let uid = user.id.to_string();
    let row = blocking(&state, move |db| db.create_message(&uid, &form.text)).await?;
    info!("{} posted message {}", user.username, row.id);

    Ok(found(format!("/users/{}", user.id)))
}

/// GET /messages/{message_id}
pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let mid = message_id.to_string();
    let row = blocking(&state, move |db| db.get_message(&mid))
        .await?
        .ok_or(ApiError::NotFound("message"))?;

    Ok(Json(convert::message(row)))
}

/// POST /messages/{message_id}/delete (author only)
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(message_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let user = current.require()?;

    let mid = message_id.to_string();
    let uid = user.id.to_string();
    blocking(&state, move |db| db.delete_message(&mid, &uid)).await?;

    Ok(found(format!("/users/{}", user.id)))
}
