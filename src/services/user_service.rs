//! Domain service for the user admin resource.
//!
//! Validation, persistence and avatar storage for user records, driven by
//! the declarative [`UserResource`](crate::admin::UserResource) form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::admin::{FormData, ResourceDescriptor, SortDirection, ValidationErrors};
use crate::db::repositories::user::RoleRef;

/// Errors specific to user administration.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("User not found: {0}")]
    NotFound(i32),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Submitted form state for create and edit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    /// Path returned by the avatar upload endpoint; blank clears it.
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub roles: Vec<i32>,
}

impl FormData for UserInput {
    fn text(&self, field: &str) -> Option<&str> {
        match field {
            "name" => self.name.as_deref(),
            "username" => self.username.as_deref(),
            "email" => self.email.as_deref(),
            "password" => self.password.as_deref(),
            "password_confirmation" => self.password_confirmation.as_deref(),
            "avatar_url" => self.avatar_url.as_deref(),
            _ => None,
        }
    }
}

/// User record as exposed by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    /// Where the avatar is served from, if one is set.
    pub avatar_public_url: Option<String>,
    pub roles: Vec<RoleRef>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub data: Vec<UserDto>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub last_page: u64,
    pub sort: String,
    pub direction: SortDirection,
}

/// A file accepted by the avatar upload endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub path: String,
    pub url: String,
}

/// Domain service trait for user administration.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Serializable resource descriptor, with page flags resolved.
    fn describe(&self) -> ResourceDescriptor;

    /// Whether create, edit and delete-one operations are switched on.
    fn editing_enabled(&self) -> bool;

    /// Paginated, searchable, sortable listing.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for an unknown sort column or an
    /// out-of-range page size.
    async fn list(&self, query: UserListQuery) -> Result<UserListResponse, UserError>;

    async fn get(&self, id: i32) -> Result<UserDto, UserError>;

    /// Validates the form in create context and inserts the user.
    async fn create(&self, input: UserInput) -> Result<UserDto, UserError>;

    /// Validates the form in edit context and applies it to user `id`.
    async fn update(&self, id: i32, input: UserInput) -> Result<UserDto, UserError>;

    /// Checks and stores an avatar image, returning its disk path.
    async fn upload_avatar(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, UserError>;

    /// Removes the stored avatar file and clears the attribute.
    async fn delete_avatar(&self, id: i32) -> Result<UserDto, UserError>;

    async fn delete(&self, id: i32) -> Result<(), UserError>;

    /// Deletes exactly the selected users. Returns how many were removed.
    async fn bulk_delete(&self, ids: &[i32]) -> Result<u64, UserError>;

    /// Options for the roles select, optionally filtered by name.
    async fn role_options(&self, search: Option<&str>) -> Result<Vec<RoleRef>, UserError>;
}
