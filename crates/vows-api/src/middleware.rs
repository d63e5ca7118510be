use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use vows_types::models::UserId;

use crate::session::Session;

/// The signed-in user, inserted by [`require_auth`] for protected handlers.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

/// Redirect anonymous requests to the landing page before any protected
/// handler runs.
pub async fn require_auth(session: Session, mut req: Request, next: Next) -> Response {
    match session.user_id {
        Some(user_id) => {
            req.extensions_mut().insert(CurrentUser(user_id));
            next.run(req).await
        }
        None => {
            debug!("Unauthenticated request to {}, redirecting", req.uri().path());
            Redirect::to("/").into_response()
        }
    }
}
