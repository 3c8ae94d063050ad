//! Read-only site settings for the frontend.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::{SiteSettings, ALLOWED_WINDOWS};
use crate::errors::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub site: SiteSettings,
    pub allowed_windows: Vec<u32>,
}

/// GET /api/v1/settings — site name, limits and toggles.
pub async fn get(State(state): State<AppState>) -> Json<ApiResponse<SettingsResponse>> {
    ApiResponse::success(SettingsResponse {
        site: state.config.site.clone(),
        allowed_windows: ALLOWED_WINDOWS.to_vec(),
    })
}
