use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;
use uuid::Uuid;

use vows_types::models::UserId;

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "vows_session";

/// Per-browser state. Holds at most the signed-in user.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user_id: Option<UserId>,
}

impl Session {
    /// Resolve the session cookie against the store. Unknown tokens yield an
    /// anonymous session.
    pub fn load(state: &AppStateInner, jar: &CookieJar) -> Result<Self, ApiError> {
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Ok(Self::default());
        };

        let user_id = state.db.session_user(&token)?;
        if user_id.is_none() {
            debug!("Ignoring unknown session token");
        }

        Ok(Self {
            token: Some(token),
            user_id,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Session::load(state, &jar)
    }
}

/// Store a fresh session for `user_id` and hand its cookie to the browser.
pub fn start_session(
    state: &AppStateInner,
    jar: CookieJar,
    user_id: UserId,
) -> Result<CookieJar, ApiError> {
    let token = Uuid::new_v4().to_string();
    state.db.create_session(&token, user_id)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies);

    Ok(jar.add(cookie))
}

/// Forget the current session. Safe to call without one.
pub fn end_session(state: &AppStateInner, jar: CookieJar) -> Result<CookieJar, ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.db.delete_session(cookie.value())?;
    }

    Ok(jar.remove(Cookie::build(SESSION_COOKIE).path("/")))
}
