use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};
use uuid::Uuid;

use warbler_db::DbError;
use warbler_db::models::ProfileUpdate;
use warbler_types::api::{ProfileForm, SearchQuery, UserDetail, UserList};
use warbler_types::models::User;

use crate::auth::{AppState, blocking, found};
use crate::convert;
use crate::error::ApiError;
use crate::middleware::{CurrentUser, end_session, start_session};

/// Messages shown on a profile page.
const PROFILE_MESSAGE_LIMIT: u32 = 100;

/// GET /users?q=: everyone, or usernames containing `q`.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let rows = blocking(&state, move |db| db.search_users(query.q.as_deref())).await?;
    Ok(Json(convert::users(rows)))
}

/// GET /users/{user_id}
pub async fn show_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDetail>, ApiError> {
    let uid = user_id.to_string();
    let (user, stats, messages) = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_id(&uid)? else {
            return Ok(None);
        };
        let stats = db.user_stats(&uid)?;
        let messages = db.messages_for_user(&uid, PROFILE_MESSAGE_LIMIT)?;
        Ok(Some((user, stats, messages)))
    })
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(UserDetail {
        user: convert::user(user),
        stats: convert::stats(stats),
        messages: convert::messages(messages),
    }))
}

/// GET /users/{user_id}/following
pub async fn show_following(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserList>, ApiError> {
    current.require()?;
    user_list(&state, user_id, Relation::Following).await
}

/// GET /users/{user_id}/followers
pub async fn show_followers(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserList>, ApiError> {
    current.require()?;
    user_list(&state, user_id, Relation::Followers).await
}

#[derive(Clone, Copy)]
enum Relation {
    Following,
    Followers,
}

async fn user_list(
    state: &AppState,
    user_id: Uuid,
    relation: Relation,
) -> Result<Json<UserList>, ApiError> {
    let uid = user_id.to_string();
    let (user, users) = blocking(state, move |db| {
        let Some(user) = db.get_user_by_id(&uid)? else {
            return Ok(None);
        };
        let users = match relation {
            Relation::Following => db.following(&uid)?,
            Relation::Followers => db.followers(&uid)?,
        };
        Ok(Some((user, users)))
    })
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(UserList {
        user: convert::user(user),
        users: convert::users(users),
    }))
}

/// POST /users/follow/{user_id}
pub async fn follow(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(leader_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let user = current.require()?;

    let uid = user.id.to_string();
    let lid = leader_id.to_string();
    match blocking(&state, move |db| db.follow(&uid, &lid)).await {
        Ok(_) => info!("{} followed {}", user.username, leader_id),
        // Already following: nothing to do
        Err(ApiError::Db(DbError::UniquenessViolation(_))) => {
            debug!("{} already follows {}", user.username, leader_id)
        }
        Err(e) => return Err(e),
    }

    Ok(found(format!("/users/{}/following", user.id)))
}

/// POST /users/stop-following/{user_id}
pub async fn stop_following(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(leader_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let user = current.require()?;

    let uid = user.id.to_string();
    let lid = leader_id.to_string();
    let removed = blocking(&state, move |db| db.unfollow(&uid, &lid)).await?;
    if removed {
        info!("{} stopped following {}", user.username, leader_id);
    }

    Ok(found(format!("/users/{}/following", user.id)))
}

/// POST /users/profile (requires the current password).
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Result<Response, ApiError> {
    let user = current.require()?;

    let uid = user.id.to_string();
    let row = blocking(&state, move |db| {
        let update = ProfileUpdate {
            username: &form.username,
            email: &form.email,
            image_url: form.image_url.as_deref(),
            header_image_url: form.header_image_url.as_deref(),
            bio: form.bio.as_deref(),
            location: form.location.as_deref(),
        };
        db.update_profile_confirmed(&uid, &form.password, &update)
    })
    .await?
    .ok_or(ApiError::InvalidCredentials)?;

    let updated = convert::user(row);
    info!("{} updated their profile", updated.username);

    // The session carries the username, so reissue it
    let jar = start_session(&state.session_secret, jar, &updated)?;
    Ok((jar, found(format!("/users/{}", updated.id))).into_response())
}

/// POST /users/delete: removes the account with its messages, follows and likes.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let user = current.require()?;

    let uid = user.id.to_string();
    blocking(&state, move |db| db.delete_user(&uid)).await?;
    info!("Deleted account {}", user.username);

    Ok((end_session(jar), found("/signup")).into_response())
}
