//! Dashboard routes: aggregated statistics and the daily CSV export.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::RequireModerator;
use crate::services::dashboard::{self, DashboardStats, StatsQuery, UserUsageStats};
use crate::AppState;

/// Query parameters shared by the stats endpoints.
#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub window_days: Option<u32>,
    pub search: Option<String>,
}

/// GET /api/v1/dashboard/stats — platform-wide statistics (moderator+).
pub async fn stats(
    State(state): State<AppState>,
    RequireModerator(_moderator): RequireModerator,
    Query(params): Query<StatsParams>,
) -> Result<Json<ApiResponse<DashboardStats>>, AppError> {
    let query = StatsQuery::from_request(params.window_days, params.search, &state.config.site)?;
    let stats = dashboard::get_stats(&state.store, &query, Utc::now()).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/v1/dashboard/export — daily series as CSV (moderator+).
pub async fn export(
    State(state): State<AppState>,
    RequireModerator(_moderator): RequireModerator,
    Query(params): Query<StatsParams>,
) -> Result<Response, AppError> {
    let query = StatsQuery::from_request(params.window_days, None, &state.config.site)?;
    let now = Utc::now();
    let csv = dashboard::export_daily_csv(&state.store, query.window_days, now).await?;
    let disposition = format!(
        "attachment; filename=\"usage-{}d-{}.csv\"",
        query.window_days,
        now.format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// GET /api/v1/me/stats — the caller's own usage statistics.
pub async fn my_stats(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<StatsParams>,
) -> Result<Json<ApiResponse<UserUsageStats>>, AppError> {
    let query = StatsQuery::from_request(params.window_days, None, &state.config.site)?;
    let stats = dashboard::get_user_stats(&state.store, &user.id, &query, Utc::now()).await?;
    Ok(ApiResponse::success(stats))
}
