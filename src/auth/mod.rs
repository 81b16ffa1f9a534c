use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractor;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod token;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
