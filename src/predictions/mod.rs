use axum::Router;

use crate::state::AppState;

pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::predict_routes())
        .merge(handlers::history_routes())
}
