pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(health::health_handler))
        // Uploads
        .route(
            "/api/v1/uploads",
            post(handlers::handle_stage_uploads).get(handlers::handle_list_uploads),
        )
        .route("/api/v1/uploads/:index", delete(handlers::handle_remove_upload))
        // Processing & results
        .route("/api/v1/resumes/process", post(handlers::handle_process))
        .route("/api/v1/results", get(handlers::handle_get_results))
        .route("/api/v1/filters", put(handlers::handle_update_filters))
        .route("/api/v1/charts", get(handlers::handle_get_charts))
        .route("/api/v1/categories", get(handlers::handle_get_categories))
        // Exports & shortlist
        .route("/api/v1/export/csv", post(handlers::handle_export_csv))
        .route(
            "/api/v1/export/filtered-csv",
            post(handlers::handle_export_filtered_csv),
        )
        .route("/api/v1/shortlist", post(handlers::handle_shortlist))
        // JD generation
        .route("/api/v1/jd/generate", post(handlers::handle_generate_jd))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
