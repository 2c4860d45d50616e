// Pizza Insights - Web Server
// JSON dashboard API with Axum

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use pizza_insights::{
    load_config, logging, Dashboard, Dataset, FilterQuery, FilterSelection, LoadSummary,
    ObservedValues,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state; the dataset is immutable so no lock is needed
#[derive(Clone)]
struct AppState {
    dataset: Arc<Dataset>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}

#[derive(Serialize)]
struct DashboardResponse {
    selection: FilterSelection,
    matched: bool,
    dashboard: Dashboard,
}

#[derive(Serialize)]
struct SummaryResponse {
    pricing: &'static str,
    rank_limit: usize,
    #[serde(flatten)]
    load: LoadSummary,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard?months=January,March&hours=12 - Dashboard for one selection
async fn get_dashboard(
    State(state): State<AppState>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "rejected dashboard query");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };
    let selection = query.to_selection();
    let dashboard = state.dataset.dashboard(&selection);

    tracing::debug!(selection = %selection.describe(), "dashboard requested");

    Json(ApiResponse::ok(DashboardResponse {
        matched: !dashboard.is_empty(),
        selection,
        dashboard,
    }))
    .into_response()
}

/// Unknown routes
async fn not_found(uri: Uri) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("No route for {}", uri.path()))
}

/// GET /api/filters - Values available per filter dimension
async fn get_filters(State(state): State<AppState>) -> impl IntoResponse {
    let observed: ObservedValues = state.dataset.observed_values();
    Json(ApiResponse::ok(observed))
}

/// GET /api/summary - How the dataset was built
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let dataset = &state.dataset;
    Json(ApiResponse::ok(SummaryResponse {
        pricing: dataset.pricing().label(),
        rank_limit: dataset.rank_limit(),
        load: dataset.summary().clone(),
    }))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/filters", get(get_filters))
        .route("/summary", get(get_summary))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Usage: pizza-server [CSV] [CONFIG]
    let mut args = std::env::args().skip(1);
    let csv_arg = args.next().map(PathBuf::from);
    let config_arg = args.next().map(PathBuf::from);

    let config = load_config(config_arg.as_deref()).context("Failed to load configuration")?;
    logging::init(&config.logging).context("Failed to initialize logging")?;

    println!("🌐 Pizza Insights - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let csv_path = csv_arg.unwrap_or_else(|| config.input.path.clone());
    let dataset = Dataset::load(&csv_path, &config.pipeline)
        .with_context(|| format!("Failed to build dataset from {}", csv_path.display()))?;
    println!("✓ Dataset loaded: {} rows from {:?}", dataset.len(), csv_path);

    let state = AppState {
        dataset: Arc::new(dataset),
    };
    let app = router(state);

    let addr = config.server.listen_addr.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "server listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/dashboard", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
