pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn read_router() -> Router<AppState> {
    handlers::read_routes()
}

pub fn write_router() -> Router<AppState> {
    handlers::write_routes()
}
