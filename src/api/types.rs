use serde::{Deserialize, Serialize};

use crate::admin::ValidationErrors;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-field messages for rejected form submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn invalid(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(errors.to_string()),
            errors: Some(errors),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Deserialize)]
pub struct RoleOptionsQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SettingDto {
    pub uuid: String,
    pub name: String,
    pub items: Vec<SettingItemDto>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct SettingItemDto {
    pub id: i32,
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub item_type: crate::entities::setting_items::SettingItemType,
    pub value: Option<String>,
    pub value_file: Option<String>,
    /// Public URL of `value_file`, when set.
    pub value_file_url: Option<String>,
}
