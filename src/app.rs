use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/habits",
            get(handlers::list_habits).post(handlers::create_habit),
        )
        .route(
            "/api/habits/:id",
            get(handlers::get_habit)
                .put(handlers::update_habit)
                .delete(handlers::delete_habit),
        )
        .route(
            "/api/completions",
            get(handlers::list_completions).delete(handlers::reset_completions),
        )
        .route("/api/completions/toggle", post(handlers::toggle_completion))
        .route("/api/completions/:date", get(handlers::completed_on))
        .route("/api/agenda", get(handlers::agenda))
        .route("/api/summary", get(handlers::summary))
        .route("/api/labels", get(handlers::labels))
        .route("/api/chart", get(handlers::chart))
        .route("/api/view", get(handlers::get_view).post(handlers::update_view))
        .with_state(state)
}
