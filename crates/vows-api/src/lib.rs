pub mod auth;
pub mod commitments;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod routes;
pub mod session;
pub mod validation;
pub mod views;
pub mod weddings;

pub use auth::{AppState, AppStateInner};
pub use routes::router;
