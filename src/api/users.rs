//! HTTP handlers for the user admin resource.
//!
//! Handlers stay thin: they parse the request, call the [`UserService`]
//! and wrap the result in an [`ApiResponse`].
//!
//! [`UserService`]: crate::services::UserService

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{validate_record_id, validate_search_term, validate_selection};
use super::{
    ApiError, ApiResponse, AppState, BulkDeleteRequest, BulkDeleteResponse, RoleOptionsQuery,
};
use crate::admin::{ResourceDescriptor, UserResource};
use crate::db::repositories::user::RoleRef;
use crate::services::{StoredFile, UserDto, UserInput, UserListQuery, UserListResponse};

/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<UserListResponse>>, ApiError> {
    let page = state.user_service().list(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// `GET /api/admin/users/schema`
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<ResourceDescriptor>> {
    Json(ApiResponse::success(state.user_service().describe()))
}

/// `POST /api/admin/users/bulk-delete`
pub async fn bulk_delete_users(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<ApiResponse<BulkDeleteResponse>>, ApiError> {
    let ids = validate_selection(&payload.ids)?;
    let deleted = state.user_service().bulk_delete(ids).await?;
    Ok(Json(ApiResponse::success(BulkDeleteResponse { deleted })))
}

/// `POST /api/admin/users`
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserInput>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state.user_service().create(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// `GET /api/admin/users/{id}`
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validate_record_id(id)?;
    let user = state.user_service().get(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `PUT /api/admin/users/{id}`
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UserInput>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validate_record_id(id)?;
    let user = state.user_service().update(id, payload).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `DELETE /api/admin/users/{id}`
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_record_id(id)?;
    state.user_service().delete(id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// `POST /api/admin/users/avatar`
///
/// Accepts a multipart body with one file part named `avatar_url` (or
/// `file`). The returned path is what the create/edit form submits back.
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<StoredFile>>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != UserResource::AVATAR_FIELD && name != "file" {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read file content: {e}")))?;

        let stored = state
            .user_service()
            .upload_avatar(&filename, content_type.as_deref(), &bytes)
            .await?;

        return Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))));
    }

    Err(ApiError::validation("Missing avatar file part"))
}

/// `DELETE /api/admin/users/{id}/avatar`
pub async fn delete_avatar(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validate_record_id(id)?;
    let user = state.user_service().delete_avatar(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `GET /api/admin/users/role-options`
pub async fn role_options(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoleOptionsQuery>,
) -> Result<Json<ApiResponse<Vec<RoleRef>>>, ApiError> {
    let search = validate_search_term(query.search.as_deref());
    let roles = state.user_service().role_options(search).await?;
    Ok(Json(ApiResponse::success(roles)))
}
