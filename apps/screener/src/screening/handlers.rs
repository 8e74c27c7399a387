//! Axum route handlers for the screening console.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderName},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::BackendError;
use crate::errors::AppError;
use crate::models::record::ScreeningMode;
use crate::screening::aggregate::ChartData;
use crate::screening::session::{ResultsView, ScreeningSession, StageOutcome};
use crate::screening::uploads::{ProcessingEstimate, StagedFile, StagedFileSummary};
use crate::screening::CATEGORY_CATALOGUE;
use crate::state::{Action, AppState};

const UPLOAD_FIELD: &str = "resumes";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub action: ScreeningMode,
    #[serde(default)]
    pub job_description: Option<String>,
}

/// Partial update of the live criteria. Absent fields are left unchanged;
/// an empty `category` clears the category filter.
#[derive(Debug, Deserialize)]
pub struct FilterUpdate {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct FilteredCsvRequest {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub percentage_threshold: f64,
}

#[derive(Debug, Deserialize)]
pub struct ShortlistRequest {
    #[serde(default)]
    pub percentage_threshold: f64,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Required when neither a threshold nor categories narrow the selection.
    #[serde(default)]
    pub confirm_all: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateJdRequest {
    pub job_role: String,
}

#[derive(Debug, Serialize)]
pub struct Estimates {
    pub summarize: ProcessingEstimate,
    #[serde(rename = "match")]
    pub match_: ProcessingEstimate,
}

#[derive(Debug, Serialize)]
pub struct UploadsResponse {
    pub files: Vec<StagedFileSummary>,
    pub estimates: Estimates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StageOutcome>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<&'static str>,
    pub multi_select: bool,
}

#[derive(Debug, Serialize)]
pub struct ShortlistResponse {
    pub message: String,
    pub submitted: usize,
}

#[derive(Debug, Serialize)]
pub struct GenerateJdResponse {
    pub job_description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Uploads
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/uploads
///
/// Stages resume files from a multipart body (repeated `resumes` field).
/// Appends or replaces depending on the multi-file append capability.
pub async fn handle_stage_uploads(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadsResponse>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid file '{filename}': {e}")))?;
        files.push(StagedFile {
            filename,
            content_type,
            bytes,
        });
    }

    if files.is_empty() {
        return Err(AppError::Validation("No resume files provided".to_string()));
    }

    let append = state.config.capabilities.multi_file_append;
    let mut session = state.session.write().await;
    let outcome = session.stage_files(files, append);
    if !outcome.skipped.is_empty() {
        warn!(skipped = ?outcome.skipped, "Skipped unsupported upload types");
    }
    info!(
        accepted = outcome.accepted.len(),
        staged = session.staged().len(),
        append,
        "Staged resume uploads"
    );

    Ok(Json(uploads_response(&session, Some(outcome))))
}

/// GET /api/v1/uploads
pub async fn handle_list_uploads(State(state): State<AppState>) -> Json<UploadsResponse> {
    let session = state.session.read().await;
    Json(uploads_response(&session, None))
}

/// DELETE /api/v1/uploads/:index
pub async fn handle_remove_upload(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<UploadsResponse>, AppError> {
    let mut session = state.session.write().await;
    let removed = session
        .remove_staged(index)
        .ok_or_else(|| AppError::NotFound(format!("No staged file at index {index}")))?;
    info!(filename = %removed.filename, "Removed staged upload");
    Ok(Json(uploads_response(&session, None)))
}

fn uploads_response(
    session: &ScreeningSession,
    outcome: Option<StageOutcome>,
) -> UploadsResponse {
    UploadsResponse {
        files: session.staged_summaries(),
        estimates: Estimates {
            summarize: session.processing_estimate(ScreeningMode::Summarize),
            match_: session.processing_estimate(ScreeningMode::Match),
        },
        outcome,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Processing & results
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/process
///
/// Sends the staged files to the backend for `summarize` or `match` and
/// stores the returned batch. One request may be outstanding at a time.
pub async fn handle_process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ResultsView>, AppError> {
    let job_description = request
        .job_description
        .map(|jd| jd.trim().to_string())
        .filter(|jd| !jd.is_empty());

    if request.action == ScreeningMode::Match && job_description.is_none() {
        return Err(AppError::Validation(
            "Please provide a job description to perform percentage match.".to_string(),
        ));
    }

    let _permit = state
        .in_flight
        .try_begin(Action::Process)
        .ok_or_else(|| busy(Action::Process))?;

    let files = state.session.read().await.staged().to_vec();
    if files.is_empty() {
        return Err(AppError::Validation("Missing resumes.".to_string()));
    }

    info!(
        mode = request.action.as_str(),
        files = files.len(),
        "Submitting resumes for processing"
    );

    // summarize never sends the job description
    let jd = match request.action {
        ScreeningMode::Match => job_description,
        ScreeningMode::Summarize => None,
    };

    let response = state
        .backend
        .process_resumes(files, request.action, jd)
        .await
        .map_err(|e| AppError::backend(e, "Error processing resumes. Please try again."))?;

    let mut session = state.session.write().await;
    session.apply_results(request.action, response);
    let view = session.view();
    info!(
        session = %session.id(),
        mode = request.action.as_str(),
        records = view.total,
        "Stored processed batch"
    );
    Ok(Json(view))
}

/// GET /api/v1/results
pub async fn handle_get_results(State(state): State<AppState>) -> Json<ResultsView> {
    Json(state.session.read().await.view())
}

/// PUT /api/v1/filters
///
/// Updates the category and/or threshold and returns the re-filtered view.
pub async fn handle_update_filters(
    State(state): State<AppState>,
    Json(update): Json<FilterUpdate>,
) -> Result<Json<ResultsView>, AppError> {
    if let Some(min) = update.min_percentage {
        if !min.is_finite() || min < 0.0 {
            return Err(AppError::Validation(
                "min_percentage must be a number >= 0".to_string(),
            ));
        }
    }

    let mut session = state.session.write().await;
    if let Some(min) = update.min_percentage {
        session.criteria_mut().set_min_percentage(min);
    }
    if let Some(category) = update.category {
        session.criteria_mut().set_category(Some(category));
    }
    let criteria = session.criteria();
    info!(
        min_percentage = criteria.min_percentage,
        category = criteria.category.as_deref().unwrap_or("-"),
        "Updated filters"
    );
    Ok(Json(session.view()))
}

/// GET /api/v1/charts
pub async fn handle_get_charts(State(state): State<AppState>) -> Result<Json<ChartData>, AppError> {
    if !state.config.capabilities.charts {
        return Err(AppError::Disabled("Charts"));
    }
    Ok(Json(state.session.read().await.charts()))
}

/// GET /api/v1/categories
pub async fn handle_get_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: CATEGORY_CATALOGUE.to_vec(),
        multi_select: state.config.capabilities.category_multi_select,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Exports, shortlist, JD generation
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/export/csv
///
/// Merges the summarize and match batches and returns the backend's CSV.
pub async fn handle_export_csv(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let _permit = state
        .in_flight
        .try_begin(Action::ExportCsv)
        .ok_or_else(|| busy(Action::ExportCsv))?;

    let rows = {
        let session = state.session.read().await;
        require_results(&session)?;
        session.export_rows()
    };

    info!(rows = rows.len(), "Requesting CSV export");
    let csv = state
        .backend
        .download_csv(&rows)
        .await
        .map_err(|e| AppError::backend(e, "Error downloading CSV. Please try again."))?;

    Ok(csv_download("summary_all.csv", csv))
}

/// POST /api/v1/export/filtered-csv
pub async fn handle_export_filtered_csv(
    State(state): State<AppState>,
    Json(request): Json<FilteredCsvRequest>,
) -> Result<impl IntoResponse, AppError> {
    let categories = clean_categories(request.categories);
    if categories.is_empty() {
        return Err(AppError::Validation(
            "Please select at least one category to download.".to_string(),
        ));
    }
    check_multi_select(&state, &categories)?;

    let _permit = state
        .in_flight
        .try_begin(Action::ExportFilteredCsv)
        .ok_or_else(|| busy(Action::ExportFilteredCsv))?;

    let rows = {
        let session = state.session.read().await;
        require_results(&session)?;
        session.filtered_export_rows(&categories)
    };

    info!(rows = rows.len(), categories = ?categories, "Requesting filtered CSV export");
    let csv = state
        .backend
        .download_filtered_csv(&rows, &categories, request.percentage_threshold.max(0.0))
        .await
        .map_err(|e| AppError::backend(e, "Error downloading filtered CSV. Please try again."))?;

    Ok(csv_download(&filtered_csv_name(&categories), csv))
}

/// POST /api/v1/shortlist
pub async fn handle_shortlist(
    State(state): State<AppState>,
    Json(request): Json<ShortlistRequest>,
) -> Result<Json<ShortlistResponse>, AppError> {
    let categories = clean_categories(request.categories);
    let threshold = request.percentage_threshold;
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(AppError::Validation(
            "percentage_threshold must be a number >= 0".to_string(),
        ));
    }
    if threshold == 0.0 && categories.is_empty() && !request.confirm_all {
        return Err(AppError::Validation(
            "No percentage threshold or categories selected. All matched resumes would be \
             shortlisted; resend with confirm_all to proceed."
                .to_string(),
        ));
    }
    check_multi_select(&state, &categories)?;

    let _permit = state
        .in_flight
        .try_begin(Action::Shortlist)
        .ok_or_else(|| busy(Action::Shortlist))?;

    let rows = {
        let session = state.session.read().await;
        require_results(&session)?;
        session.shortlist_rows(threshold, &categories)
    };

    info!(rows = rows.len(), threshold, "Submitting shortlist");
    let message = state
        .backend
        .shortlist(&rows, threshold, &categories)
        .await
        .map_err(|e| AppError::backend(e, "Error shortlisting resumes. Please try again."))?;

    Ok(Json(ShortlistResponse {
        message,
        submitted: rows.len(),
    }))
}

/// POST /api/v1/jd/generate
pub async fn handle_generate_jd(
    State(state): State<AppState>,
    Json(request): Json<GenerateJdRequest>,
) -> Result<Json<GenerateJdResponse>, AppError> {
    let job_role = request.job_role.trim();
    if job_role.is_empty() {
        return Err(AppError::Validation("Please enter a job role.".to_string()));
    }

    let _permit = state
        .in_flight
        .try_begin(Action::GenerateJd)
        .ok_or_else(|| busy(Action::GenerateJd))?;

    info!(job_role, "Generating job description");
    let job_description = state.backend.generate_jd(job_role).await.map_err(|e| {
        let fallback = match &e {
            BackendError::EmptyContent => "Failed to generate JD. Try again.",
            _ => "Error fetching JD. Please try again.",
        };
        AppError::backend(e, fallback)
    })?;

    Ok(Json(GenerateJdResponse { job_description }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn busy(action: Action) -> AppError {
    warn!(action = action.label(), "Rejected overlapping request");
    AppError::Conflict(format!("A {} request is already in progress", action.label()))
}

fn require_results(session: &ScreeningSession) -> Result<(), AppError> {
    if session.has_results() {
        Ok(())
    } else {
        Err(AppError::Validation(
            "No results yet. Process resumes first.".to_string(),
        ))
    }
}

fn check_multi_select(state: &AppState, categories: &[String]) -> Result<(), AppError> {
    if categories.len() > 1 && !state.config.capabilities.category_multi_select {
        return Err(AppError::Validation(
            "Only one category may be selected".to_string(),
        ));
    }
    Ok(())
}

fn clean_categories(categories: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories {
        let category = category.trim().to_string();
        if !category.is_empty() && !cleaned.contains(&category) {
            cleaned.push(category);
        }
    }
    cleaned
}

fn filtered_csv_name(categories: &[String]) -> String {
    let slug: Vec<String> = categories
        .iter()
        .map(|c| {
            c.chars()
                .map(|ch| {
                    if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                        ch
                    } else {
                        '-'
                    }
                })
                .collect()
        })
        .collect();
    format!("summary_{}.csv", slug.join("_"))
}

fn csv_download(filename: &str, body: bytes::Bytes) -> impl IntoResponse {
    let headers: [(HeaderName, String); 2] = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    (headers, body)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::stub::{StubBackend, StubCall};
    use crate::config::{Capabilities, Config};
    use crate::models::record::ProcessResponse;
    use crate::routes::build_router;

    fn test_config(capabilities: Capabilities) -> Config {
        Config {
            backend_url: "http://backend.test".to_string(),
            backend_timeout_secs: 5,
            max_upload_mb: 5,
            capabilities,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn app_with(stub: Arc<StubBackend>, capabilities: Capabilities) -> (Router, AppState) {
        let state = AppState::new(test_config(capabilities), stub);
        (build_router(state.clone()), state)
    }

    fn app(stub: Arc<StubBackend>) -> (Router, AppState) {
        app_with(stub, Capabilities::default())
    }

    fn process_response(value: Value) -> ProcessResponse {
        serde_json::from_value(value).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn stage(state: &AppState, names: &[&str]) {
        let files = names
            .iter()
            .map(|n| StagedFile {
                filename: n.to_string(),
                content_type: Some("application/pdf".to_string()),
                bytes: bytes::Bytes::from_static(b"%PDF-1.4"),
            })
            .collect();
        state.session.write().await.stage_files(files, true);
    }

    async fn seed(state: &AppState, mode: ScreeningMode, results: Value) {
        state
            .session
            .write()
            .await
            .apply_results(mode, process_response(results));
    }

    #[tokio::test]
    async fn test_stage_uploads_multipart() {
        let (router, state) = app(Arc::new(StubBackend::default()));
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"resumes\"; filename=\"a.pdf\"\r\n\
            Content-Type: application/pdf\r\n\r\n\
            %PDF-1.4\r\n\
            --XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"resumes\"; filename=\"tool.exe\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            MZ\r\n\
            --XBOUNDARY--\r\n";
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/uploads")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["files"][0]["filename"], "a.pdf");
        assert_eq!(body["outcome"]["skipped"][0], "tool.exe");
        assert_eq!(body["estimates"]["summarize"]["seconds"], 5);
        assert_eq!(body["estimates"]["match"]["seconds"], 4);
        assert_eq!(state.session.read().await.staged().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_upload_out_of_range() {
        let (router, _state) = app(Arc::new(StubBackend::default()));
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/v1/uploads/3")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_process_requires_staged_files() {
        let (router, _state) = app(Arc::new(StubBackend::default()));
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes/process",
                json!({"action": "summarize"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_match_requires_job_description() {
        let stub = Arc::new(StubBackend::default());
        let (router, state) = app(stub.clone());
        stage(&state, &["a.pdf"]).await;

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes/process",
                json!({"action": "match", "job_description": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_process_match_stores_sorted_batch() {
        let stub = Arc::new(StubBackend::returning(process_response(json!({
            "results": [
                {"filename": "a.pdf", "percentage_match": "40%", "categories": ["Backend"]},
                {"filename": "b.pdf", "percentage_match": "90%"}
            ],
            "categorized_results": {"Backend": [], "Uncategorized": []}
        }))));
        let (router, state) = app(stub.clone());
        stage(&state, &["a.pdf", "b.pdf"]).await;

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes/process",
                json!({"action": "match", "job_description": "Rust engineer"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["mode"], "match");
        assert_eq!(body["records"][0]["filename"], "b.pdf");
        assert_eq!(body["records"][1]["filename"], "a.pdf");
        assert_eq!(body["available_categories"], json!(["Backend", "Uncategorized"]));

        assert_eq!(
            stub.calls(),
            vec![StubCall::Process {
                mode: ScreeningMode::Match,
                filenames: vec!["a.pdf".to_string(), "b.pdf".to_string()],
                job_description: Some("Rust engineer".to_string()),
            }]
        );
        assert!(!state.in_flight.is_busy(Action::Process));
    }

    #[tokio::test]
    async fn test_summarize_does_not_forward_job_description() {
        let stub = Arc::new(StubBackend::default());
        let (router, state) = app(stub.clone());
        stage(&state, &["a.pdf"]).await;

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes/process",
                json!({"action": "summarize", "job_description": "ignored"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(matches!(
            &stub.calls()[0],
            StubCall::Process { job_description: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_overlapping_process_is_rejected() {
        let stub = Arc::new(StubBackend::default());
        let (router, state) = app(stub.clone());
        stage(&state, &["a.pdf"]).await;

        let _outstanding = state.in_flight.try_begin(Action::Process).unwrap();
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes/process",
                json!({"action": "summarize"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_process_requests_admit_one() {
        let stub = Arc::new(StubBackend {
            delay: Some(Duration::from_millis(200)),
            ..StubBackend::default()
        });
        let (router, state) = app(stub.clone());
        stage(&state, &["a.pdf"]).await;

        let first = tokio::spawn(router.clone().oneshot(json_request(
            "POST",
            "/api/v1/resumes/process",
            json!({"action": "summarize"}),
        )));
        while !state.in_flight.is_busy(Action::Process) {
            tokio::task::yield_now().await;
        }

        let second = router
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes/process",
                json!({"action": "summarize"}),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(second).await["error"]["code"], "REQUEST_IN_FLIGHT");

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(stub.calls().len(), 1);
        assert!(!state.in_flight.is_busy(Action::Process));
    }

    #[tokio::test]
    async fn test_backend_failure_reports_message_and_releases_guard() {
        let stub = Arc::new(StubBackend::failing("Gemini quota exceeded"));
        let (router, state) = app(stub);
        stage(&state, &["a.pdf"]).await;

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes/process",
                json!({"action": "summarize"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Gemini quota exceeded");
        assert!(!state.in_flight.is_busy(Action::Process));
        assert!(!state.session.read().await.has_results());
    }

    #[tokio::test]
    async fn test_update_filters_refilters_view() {
        let (router, state) = app(Arc::new(StubBackend::default()));
        seed(
            &state,
            ScreeningMode::Match,
            json!([
                {"filename": "a.pdf", "percentage_match": "40%"},
                {"filename": "b.pdf", "percentage_match": "90%"},
                {"filename": "c.pdf", "percentage_match": "abc"}
            ]),
        )
        .await;

        let response = router
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/v1/filters",
                json!({"min_percentage": 50}),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["visible"], 1);
        assert_eq!(body["records"][0]["filename"], "b.pdf");
        assert_eq!(body["applied_filters"], "Percentage Match >= 50%");

        let response = router
            .oneshot(json_request(
                "PUT",
                "/api/v1/filters",
                json!({"min_percentage": -1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_charts_follow_capability() {
        let (router, state) = app(Arc::new(StubBackend::default()));
        seed(
            &state,
            ScreeningMode::Summarize,
            json!([{"filename": "a.pdf", "categories": ["Cloud"]}]),
        )
        .await;
        let response = router.oneshot(get("/api/v1/charts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["bar"]["labels"], json!(["Cloud"]));
        assert_eq!(body["visible"], true);

        let disabled = Capabilities {
            charts: false,
            ..Capabilities::default()
        };
        let (router, _state) = app_with(Arc::new(StubBackend::default()), disabled);
        let response = router.oneshot(get("/api/v1/charts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_categories_catalogue() {
        let (router, _state) = app(Arc::new(StubBackend::default()));
        let body = body_json(router.oneshot(get("/api/v1/categories")).await.unwrap()).await;
        assert_eq!(body["categories"].as_array().unwrap().len(), 10);
        assert_eq!(body["categories"][9], "Uncategorized");
        assert_eq!(body["multi_select"], true);
    }

    #[tokio::test]
    async fn test_export_csv_requires_results() {
        let (router, _state) = app(Arc::new(StubBackend::default()));
        let response = router
            .oneshot(json_request("POST", "/api/v1/export/csv", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_csv_merges_batches() {
        let stub = Arc::new(StubBackend::default());
        let (router, state) = app(stub.clone());
        seed(
            &state,
            ScreeningMode::Summarize,
            json!([{"filename": "a.pdf"}, {"filename": "b.pdf"}]),
        )
        .await;
        seed(
            &state,
            ScreeningMode::Match,
            json!([{"filename": "a.pdf", "percentage_match": "72%"}]),
        )
        .await;

        let response = router
            .oneshot(json_request("POST", "/api/v1/export/csv", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"summary_all.csv\""
        );
        assert_eq!(stub.calls(), vec![StubCall::Csv { rows: 2 }]);
    }

    #[tokio::test]
    async fn test_filtered_csv_validation_and_filename() {
        let stub = Arc::new(StubBackend::default());
        let (router, state) = app(stub.clone());
        seed(
            &state,
            ScreeningMode::Summarize,
            json!([
                {"filename": "a.pdf", "categories": ["AI/ML"]},
                {"filename": "b.pdf", "categories": ["Backend"]},
                {"filename": "c.pdf", "categories": ["HR"]}
            ]),
        )
        .await;

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/export/filtered-csv",
                json!({"categories": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/export/filtered-csv",
                json!({"categories": ["AI/ML", "Backend"], "percentage_threshold": 30}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"summary_AI-ML_Backend.csv\""
        );
        assert_eq!(
            stub.calls(),
            vec![StubCall::FilteredCsv {
                rows: 2,
                categories: vec!["AI/ML".to_string(), "Backend".to_string()],
                threshold: 30.0,
            }]
        );
    }

    #[tokio::test]
    async fn test_single_category_mode_rejects_multiple() {
        let single = Capabilities {
            category_multi_select: false,
            ..Capabilities::default()
        };
        let (router, state) = app_with(Arc::new(StubBackend::default()), single);
        seed(&state, ScreeningMode::Summarize, json!([{"filename": "a.pdf"}])).await;

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/export/filtered-csv",
                json!({"categories": ["HR", "Cloud"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_shortlist_needs_confirmation_without_filters() {
        let stub = Arc::new(StubBackend::default());
        let (router, state) = app(stub.clone());
        seed(
            &state,
            ScreeningMode::Match,
            json!([
                {"filename": "a.pdf", "percentage_match": "80%"},
                {"filename": "b.pdf", "percentage_match": "30%"}
            ]),
        )
        .await;

        let response = router
            .clone()
            .oneshot(json_request("POST", "/api/v1/shortlist", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(stub.calls().is_empty());

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/shortlist",
                json!({"confirm_all": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["submitted"], 2);

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/shortlist",
                json!({"percentage_threshold": 50}),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["submitted"], 1);
        assert_eq!(body["message"], "1 resumes shortlisted");
    }

    #[tokio::test]
    async fn test_generate_jd() {
        let (router, _state) = app(Arc::new(StubBackend::default()));
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/jd/generate",
                json!({"job_role": "  "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/jd/generate",
                json!({"job_role": "Data Engineer"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["job_description"],
            "We are hiring a Data Engineer."
        );
    }

    #[test]
    fn test_filtered_csv_name_slug() {
        let name = filtered_csv_name(&["Full Stack".to_string(), "AI/ML".to_string()]);
        assert_eq!(name, "summary_Full-Stack_AI-ML.csv");
    }

    #[test]
    fn test_clean_categories_dedups_and_trims() {
        let cleaned = clean_categories(vec![
            " HR ".to_string(),
            "".to_string(),
            "HR".to_string(),
            "Cloud".to_string(),
        ]);
        assert_eq!(cleaned, vec!["HR", "Cloud"]);
    }
}
