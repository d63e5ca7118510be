use axum::{extract::State, response::Html};
use tera::Context;

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /privacy
pub async fn privacy(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    state.views.render("privacy.html", &Context::new())
}
