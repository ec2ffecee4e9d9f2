use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod seed;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::catalog_routes()
}
