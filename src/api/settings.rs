use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SettingDto, SettingItemDto};

/// `GET /api/settings`
///
/// Read-only view of the seeded setting groups and their items.
pub async fn list_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SettingDto>>>, ApiError> {
    let groups = state.store().list_settings().await?;
    let disk = state.disk();

    let dtos = groups
        .into_iter()
        .map(|(setting, items)| SettingDto {
            uuid: setting.uuid.to_string(),
            name: setting.name,
            items: items
                .into_iter()
                .map(|item| SettingItemDto {
                    id: item.id,
                    name: item.name,
                    key: item.key,
                    item_type: item.item_type,
                    value: item.value,
                    value_file_url: item.value_file.as_deref().map(|p| disk.url(p)),
                    value_file: item.value_file,
                })
                .collect(),
            created_at: setting.created_at,
            updated_at: setting.updated_at,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}
