use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::{load_session, require_user};
use crate::{likes, messages, users};

/// All Warbler routes. Every request passes through `load_session`, so
/// handlers can always extract `Extension<CurrentUser>`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(messages::home))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::show_user))
        .route("/messages/{message_id}", get(messages::show_message))
        .merge(members_only())
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .with_state(state)
}

/// Routes that answer `Access unauthorized.` to anonymous visitors, whatever
/// the request body.
fn members_only() -> Router<AppState> {
    Router::new()
        .route("/users/profile", post(users::update_profile))
        .route("/users/delete", post(users::delete_user))
        .route("/users/follow/{user_id}", post(users::follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route("/users/{user_id}/following", get(users::show_following))
        .route("/users/{user_id}/followers", get(users::show_followers))
        .route("/users/{user_id}/likes", get(likes::show_likes))
        .route("/messages/new", post(messages::create_message))
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .route("/messages/{message_id}/like", post(likes::toggle_like))
        .route_layer(middleware::from_fn(require_user))
}
