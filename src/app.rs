use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/entries", post(handlers::submit_entry))
        .route("/api/restore", post(handlers::restore_entry))
        .route("/api/schema", get(handlers::get_schema))
        .route("/api/user", get(handlers::get_user))
        .route("/api/user/clear", post(handlers::clear_user))
        .with_state(state)
}
