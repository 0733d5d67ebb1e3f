use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use warbler_db::Database;
use warbler_types::api::{LoginForm, SignupForm};

use crate::convert;
use crate::error::ApiError;
use crate::middleware::{end_session, start_session};

const MIN_PASSWORD_LEN: usize = 6;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session_secret: String,
}

/// Run a blocking DB call off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}

/// 302 Found with a Location header.
pub fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, ApiError> {
    // Validate input
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    if !form.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address.".into()));
    }

    // Argon2 hashing happens inside signup, so it stays on the blocking pool
    let row = blocking(&state, move |db| {
        db.signup(
            &form.email,
            &form.username,
            &form.password,
            form.image_url.as_deref(),
        )
    })
    .await?;

    let user = convert::user(row);
    info!("Signed up {}", user.username);

    let jar = start_session(&state.session_secret, jar, &user)?;
    Ok((jar, found("/")).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let row = blocking(&state, move |db| db.authenticate(&form.username, &form.password))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let user = convert::user(row);
    info!("Hello, {}!", user.username);

    let jar = start_session(&state.session_secret, jar, &user)?;
    Ok((jar, found("/")).into_response())
}

pub async fn logout(jar: CookieJar) -> Response {
    (end_session(jar), found("/login")).into_response()
}
