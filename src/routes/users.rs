//! User administration routes (admin only).

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::user::{UpdateRole, UserRecord};
use crate::services::users::{self as user_service, UserFilters};
use crate::AppState;

/// GET /api/v1/users — list users with filters and pagination.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<UserFilters>,
) -> Result<Json<ApiResponse<PagedResult<UserRecord>>>, AppError> {
    let result = user_service::list(&state.store, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// PATCH /api/v1/users/{id}/role — change a user's role.
pub async fn update_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateRole>,
) -> Result<Json<ApiResponse<UserRecord>>, AppError> {
    let user = user_service::update_role(&state.store, &id, body.role, &admin.id).await?;
    Ok(ApiResponse::success(user))
}
