//! REST API endpoint handlers
//!
//! Every handler hands its work to the blocking pool: the DuckDB and SQLite
//! connections are synchronous and guarded by mutexes.

use crate::api::types::*;
use crate::error::{AppError, Result};
use crate::services::*;
use crate::state::AppState;
use axum::{
    extract::{Json, Query, State as AxumState},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

/// Shared state for API handlers
pub type ApiState = Arc<AppState>;

type ApiResult<T> = Result<Json<ApiResponse<T>>>;

/// Run `f` against the application state on the blocking pool
async fn blocking<T, F>(state: ApiState, f: F) -> Result<T>
where
    F: FnOnce(&AppState) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

fn ok<T: serde::Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success_with_data(data)))
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint - GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::<Empty>::success_with_message("Zone Dashboard API is running"))
}

// ============================================================================
// Catalog
// ============================================================================

/// Categories - GET /api/v1/categories
pub async fn get_categories(AxumState(state): AxumState<ApiState>) -> ApiResult<Vec<String>> {
    ok(blocking(state, CatalogService::categories).await?)
}

/// Symbols - GET /api/v1/symbols?category=
pub async fn get_symbols(
    AxumState(state): AxumState<ApiState>,
    Query(query): Query<SymbolsQuery>,
) -> ApiResult<Vec<String>> {
    ok(blocking(state, move |s| CatalogService::symbols(s, query.category.as_deref())).await?)
}

/// Covered date range - GET /api/v1/daterange
pub async fn get_date_range(AxumState(state): AxumState<ApiState>) -> ApiResult<DateRange> {
    ok(blocking(state, CatalogService::date_range).await?)
}

/// Raw bars of one contract - POST /api/v1/bars/query
pub async fn query_bars(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<BarsQuery>,
) -> ApiResult<Vec<crate::db::duckdb::models::OhlcvRow>> {
    ok(blocking(state, move |s| CatalogService::load_bars(s, &req)).await?)
}

/// Ingest bars - POST /api/v1/bars
pub async fn ingest_bars(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<IngestRequest>,
) -> ApiResult<IngestResult> {
    info!("Ingest request with {} bars", req.bars.len());
    ok(blocking(state, move |s| HistoryService::store_bars(s, &req.bars)).await?)
}

/// Session-window filter - POST /api/v1/sessions
pub async fn filter_sessions(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<SessionResult> {
    ok(blocking(state, move |s| SessionService::filter(s, &req)).await?)
}

// ============================================================================
// Zone Analysis
// ============================================================================

/// Classify days - POST /api/v1/zones/classify
pub async fn classify_zones(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> ApiResult<Vec<ClassifiedDay>> {
    ok(blocking(state, move |s| ZoneService::classify_days(s, &req)).await?)
}

/// Midnight-open retracement - POST /api/v1/stats/retracement
pub async fn midnight_retracement(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> ApiResult<RetracementStats> {
    ok(blocking(state, move |s| {
        let selection = ZoneService::select(s, &req)?;
        RetracementService::midnight_open(s, &selection)
    })
    .await?)
}

/// Zone 1 retracement - POST /api/v1/stats/zone1-retracement
pub async fn zone1_retracement(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> ApiResult<RetracementStats> {
    ok(blocking(state, move |s| {
        let selection = ZoneService::select(s, &req)?;
        RetracementService::zone1(s, &selection)
    })
    .await?)
}

/// High/low of day - POST /api/v1/stats/day-extremes
pub async fn day_extremes(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> ApiResult<DayStats> {
    ok(blocking(state, move |s| {
        let selection = ZoneService::select(s, &req)?;
        DayStatsService::compute(s, &selection)
    })
    .await?)
}

/// Bullish/bearish opening candles - POST /api/v1/stats/direction
pub async fn direction(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> ApiResult<DirectionStats> {
    ok(blocking(state, move |s| {
        let selection = ZoneService::select(s, &req)?;
        DirectionService::compute(s, &selection)
    })
    .await?)
}

/// Full pipeline - POST /api/v1/dashboard
pub async fn dashboard(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> ApiResult<Arc<DashboardResult>> {
    ok(blocking(state, move |s| DashboardService::run(s, &req)).await?)
}

// ============================================================================
// Settings
// ============================================================================

/// Read settings - GET /api/v1/settings
pub async fn get_settings(
    AxumState(state): AxumState<ApiState>,
) -> ApiResult<crate::db::sqlite::DashboardSettings> {
    ok(blocking(state, SettingsService::get).await?)
}

/// Update settings - POST /api/v1/settings
pub async fn update_settings(
    AxumState(state): AxumState<ApiState>,
    Json(req): Json<crate::db::sqlite::SettingsUpdate>,
) -> ApiResult<crate::db::sqlite::DashboardSettings> {
    ok(blocking(state, move |s| SettingsService::update(s, &req)).await?)
}
