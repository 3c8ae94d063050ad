//! Gallery routes: paginated listing and generation requests.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::image::{GenerateImage, ImageRecord};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::gallery::{self, GalleryFilters};
use crate::AppState;

/// GET /api/v1/images — list gallery images with filters and pagination.
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<GalleryFilters>,
) -> Result<Json<ApiResponse<PagedResult<ImageRecord>>>, AppError> {
    let result = gallery::list(&state.store, &user, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/images/generate — submit a generation request.
pub async fn generate(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<GenerateImage>,
) -> Result<Json<ApiResponse<ImageRecord>>, AppError> {
    let image = gallery::generate(&state.store, &user, &body).await?;
    Ok(ApiResponse::success(image))
}
