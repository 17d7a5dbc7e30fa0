use axum::Json;

use super::ApiResponse;
use crate::admin::{self, Navigation};

/// `GET /api/admin/navigation`
pub async fn navigation() -> Json<ApiResponse<Vec<Navigation>>> {
    Json(ApiResponse::success(admin::navigation()))
}
