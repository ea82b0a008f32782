use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod discovery;
pub mod dto;
pub mod handlers;
pub mod login_state;
pub mod middleware;
pub mod provider;
pub mod services;
pub mod verifier;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
