use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use warbler_types::api::SessionClaims;
use warbler_types::models::User;

use crate::auth::{AppState, blocking};
use crate::convert;
use crate::error::ApiError;

/// Cookie holding the signed session.
pub const CURR_USER_KEY: &str = "curr_user";

const SESSION_DAYS: i64 = 30;

/// The user resolved from the session cookie, if any. Inserted on every request.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn require(&self) -> Result<&User, ApiError> {
        self.0.as_ref().ok_or(ApiError::Unauthorized)
    }
}

/// Resolve the session cookie into a `CurrentUser` extension. A missing,
/// invalid or expired token, or one naming a deleted user, is anonymous.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = jar
        .get(CURR_USER_KEY)
        .and_then(|cookie| decode_token(&state.session_secret, cookie.value()));

    let user = match claims {
        Some(claims) => {
            let id = claims.sub.to_string();
            let row = blocking(&state, move |db| db.get_user_by_id(&id)).await?;
            if row.is_none() {
                debug!("Session for missing user {}", claims.sub);
            }
            row.map(convert::user)
        }
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Reject anonymous requests before the handler's extractors read the body.
/// Must sit inside `load_session`.
pub async fn require_user(req: Request, next: Next) -> Result<Response, ApiError> {
    let signed_in = req
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.0.is_some());

    if !signed_in {
        debug!("Anonymous request to {} rejected", req.uri().path());
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}

pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
) -> jsonwebtoken::errors::Result<String> {
    let claims = SessionClaims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_token(secret: &str, token: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()
}

/// Attach a fresh session for `user` to the jar.
pub fn start_session(secret: &str, jar: CookieJar, user: &User) -> Result<CookieJar, ApiError> {
    let token = issue_token(secret, user.id, &user.username).map_err(|e| {
        tracing::error!("Failed to sign session token: {}", e);
        ApiError::Internal
    })?;

    let cookie = Cookie::build((CURR_USER_KEY, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok(jar.add(cookie))
}

pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(CURR_USER_KEY).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrips_claims() {
        let id = Uuid::new_v4();
        let token = issue_token("secret", id, "testuser").unwrap();

        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "testuser");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token("secret", Uuid::new_v4(), "testuser").unwrap();
        assert!(decode_token("other-secret", &token).is_none());
        assert!(decode_token("secret", "garbage").is_none());
    }
}
