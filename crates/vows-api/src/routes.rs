use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{commitments, pages, weddings};

/// All application routes. Everything under `/weddings` and `/commitments`
/// sits behind the session guard.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(auth::index))
        .route("/users/create", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/privacy", get(pages::privacy));

    let protected_routes = Router::new()
        .route("/weddings", get(weddings::list_weddings))
        .route("/weddings/new", get(weddings::new_wedding))
        .route("/weddings/create", post(weddings::create_wedding))
        .route("/weddings/{id}", get(weddings::show_wedding))
        .route("/weddings/{id}/destroy", post(weddings::destroy_wedding))
        .route("/commitments/create", post(commitments::create_commitment))
        .route("/commitments/{id}/destroy", post(commitments::destroy_commitment))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
