//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tokio::task;
use tracing::{info, warn};

use crate::admin::form::{FileUpload, validation_attribute};
use crate::admin::{
    FormContext, FormData, FormSchema, Resource, ResourceDescriptor, SortDirection,
    UserResource, ValidationErrors,
};
use crate::config::{AdminConfig, Config, SecurityConfig};
use crate::db::Store;
use crate::db::repositories::user::{
    NewUser, RoleRef, User, UserChanges, UserListParams, hash_password,
};
use crate::services::user_service::{
    StoredFile, UserDto, UserError, UserInput, UserListQuery, UserListResponse, UserService,
};
use crate::storage::PublicDisk;

const MAX_PER_PAGE: u64 = 100;

pub struct SeaOrmUserService {
    store: Store,
    disk: PublicDisk,
    security: SecurityConfig,
    admin: AdminConfig,
    avatar_max_kb: u64,
}

impl SeaOrmUserService {
    #[must_use]
    pub fn new(store: Store, disk: PublicDisk, config: &Config) -> Self {
        Self {
            store,
            disk,
            security: config.security.clone(),
            admin: config.admin.clone(),
            avatar_max_kb: config.storage.avatar_max_kb,
        }
    }

    fn to_dto(&self, user: User) -> UserDto {
        let avatar_public_url = user.avatar_url.as_deref().map(|p| self.disk.url(p));
        UserDto {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            avatar_url: user.avatar_url,
            avatar_public_url,
            roles: user.roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    async fn find(&self, id: i32) -> Result<User, UserError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// The user form with the configured avatar size limit applied.
    fn form(&self) -> FormSchema {
        let mut form = UserResource::form();
        if let Some(upload) = form.file_upload_mut(UserResource::AVATAR_FIELD) {
            upload.max_size = Some(self.avatar_max_kb);
        }
        form
    }

    fn avatar_upload(&self) -> Result<FileUpload, UserError> {
        self.form()
            .file_upload(UserResource::AVATAR_FIELD)
            .cloned()
            .ok_or_else(|| UserError::Internal("Avatar field missing from form".to_string()))
    }

    /// Runs the form rules plus the checks that need the database.
    async fn validate(
        &self,
        input: &UserInput,
        context: FormContext,
        record: Option<i32>,
    ) -> Result<(), UserError> {
        let form = self.form();
        let mut errors = form.validate(input, context).err().unwrap_or_default();
        let repo = self.store.user_repo();

        for (field, label, ignore_record) in form.unique_fields() {
            if errors.has(field) {
                continue;
            }
            let Some(value) = input.text(field).map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };

            let ignore = if ignore_record { record } else { None };
            if repo.value_taken(field, value, ignore).await? {
                errors.add(
                    field,
                    format!("The {} has already been taken.", validation_attribute(label)),
                );
            }
        }

        let missing = self.store.role_repo().missing_ids(&input.roles).await?;
        if !missing.is_empty() {
            errors.add("roles", "The selected roles is invalid.");
        }

        errors.into_result().map_err(UserError::Validation)
    }

    async fn hash(&self, password: String) -> Result<String, UserError> {
        let security = self.security.clone();
        let hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .map_err(|e| UserError::Internal(format!("Password hashing task failed: {e}")))??;
        Ok(hash)
    }

    fn list_params(&self, query: UserListQuery) -> Result<UserListParams, UserError> {
        let table = UserResource::table();
        let mut errors = ValidationErrors::default();

        let (default_sort, default_direction) = table
            .default_sort
            .as_ref()
            .map_or(("created_at", SortDirection::Desc), |s| {
                (s.column.as_str(), s.direction)
            });

        let sort = query
            .sort
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default_sort)
            .to_string();
        if !table.is_sortable(&sort) {
            errors.add("sort", "The selected sort is invalid.");
        }

        let per_page = query.per_page.unwrap_or(self.admin.per_page);
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            errors.add(
                "per_page",
                format!("The per page field must be between 1 and {MAX_PER_PAGE}."),
            );
        }

        let page = query.page.unwrap_or(1);
        if page < 1 {
            errors.add("page", "The page field must be at least 1.");
        }

        errors.into_result()?;

        Ok(UserListParams {
            search: query.search,
            search_columns: table
                .searchable_columns()
                .into_iter()
                .map(|c| c.name.clone())
                .collect(),
            sort,
            direction: query.direction.unwrap_or(default_direction),
            page,
            per_page,
        })
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn avatar_path(input: &UserInput) -> Option<String> {
    input
        .avatar_url
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl UserService for SeaOrmUserService {
    fn describe(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            form: self.form(),
            ..UserResource::describe(self.admin.enable_user_editing)
        }
    }

    fn editing_enabled(&self) -> bool {
        self.admin.enable_user_editing
    }

    async fn list(&self, query: UserListQuery) -> Result<UserListResponse, UserError> {
        let params = self.list_params(query)?;
        let page = self.store.list_users(&params).await?;

        Ok(UserListResponse {
            data: page.users.into_iter().map(|u| self.to_dto(u)).collect(),
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            last_page: page.last_page,
            sort: params.sort,
            direction: params.direction,
        })
    }

    async fn get(&self, id: i32) -> Result<UserDto, UserError> {
        Ok(self.to_dto(self.find(id).await?))
    }

    async fn create(&self, input: UserInput) -> Result<UserDto, UserError> {
        self.validate(&input, FormContext::Create, None).await?;

        let password = input.password.clone().unwrap_or_default();
        let password_hash = self.hash(password).await?;

        let id = self
            .store
            .user_repo()
            .create(NewUser {
                name: trimmed(input.name.as_deref()),
                username: trimmed(input.username.as_deref()),
                email: trimmed(input.email.as_deref()),
                password_hash,
                avatar_url: avatar_path(&input),
                role_ids: input.roles,
            })
            .await?;

        info!(user_id = id, "User created");
        self.get(id).await
    }

    async fn update(&self, id: i32, input: UserInput) -> Result<UserDto, UserError> {
        let existing = self.find(id).await?;
        self.validate(&input, FormContext::Edit, Some(id)).await?;

        let form = self.form();
        let password_hash = match input.password.clone() {
            Some(password) if form.dehydrates("password", Some(password.as_str())) => {
                Some(self.hash(password).await?)
            }
            _ => None,
        };

        let avatar_url = avatar_path(&input);
        let updated = self
            .store
            .user_repo()
            .update(
                id,
                UserChanges {
                    name: trimmed(input.name.as_deref()),
                    username: trimmed(input.username.as_deref()),
                    email: trimmed(input.email.as_deref()),
                    password_hash,
                    avatar_url: avatar_url.clone(),
                    role_ids: input.roles,
                },
            )
            .await?;

        if !updated {
            return Err(UserError::NotFound(id));
        }

        // A replaced or cleared avatar leaves the previous file orphaned.
        if let Some(previous) = existing.avatar_url
            && avatar_url.as_deref() != Some(previous.as_str())
            && let Err(e) = self.disk.delete(&previous).await
        {
            warn!(user_id = id, path = %previous, error = %e, "Failed to remove replaced avatar");
        }

        info!(user_id = id, "User updated");
        self.get(id).await
    }

    async fn upload_avatar(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, UserError> {
        let upload = self.avatar_upload()?;
        upload.check_upload(filename, content_type, bytes)?;

        let path = upload.storage_path(filename);
        self.disk
            .put(&path, bytes)
            .await
            .map_err(|e| UserError::Storage(format!("{e:#}")))?;

        Ok(StoredFile {
            url: self.disk.url(&path),
            path,
        })
    }

    async fn delete_avatar(&self, id: i32) -> Result<UserDto, UserError> {
        let user = self.find(id).await?;

        if let Some(path) = user.avatar_url.as_deref() {
            let removed = self
                .disk
                .delete(path)
                .await
                .map_err(|e| UserError::Storage(format!("{e:#}")))?;
            info!(user_id = id, path = %path, removed, "Avatar deleted");
        }

        self.store.user_repo().set_avatar(id, None).await?;
        self.get(id).await
    }

    async fn delete(&self, id: i32) -> Result<(), UserError> {
        let user = self.find(id).await?;

        if !self.store.user_repo().delete(id).await? {
            return Err(UserError::NotFound(id));
        }

        if let Some(path) = user.avatar_url.as_deref()
            && let Err(e) = self.disk.delete(path).await
        {
            warn!(user_id = id, path = %path, error = %e, "Failed to remove avatar of deleted user");
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[i32]) -> Result<u64, UserError> {
        if ids.is_empty() {
            return Err(UserError::Validation(ValidationErrors::single(
                "ids",
                "Select at least one record.",
            )));
        }

        let repo = self.store.user_repo();
        let avatars = repo.avatar_paths(ids).await?;
        let deleted = repo.delete_many(ids).await?;

        for path in &avatars {
            if let Err(e) = self.disk.delete(path).await {
                warn!(path = %path, error = %e, "Failed to remove avatar of deleted user");
            }
        }

        info!(
            requested = ids.len(),
            deleted,
            avatars = avatars.len(),
            "Bulk deleted users"
        );
        Ok(deleted)
    }

    async fn role_options(&self, search: Option<&str>) -> Result<Vec<RoleRef>, UserError> {
        let roles = self.store.role_repo().list(search).await?;
        Ok(roles.into_iter().map(RoleRef::from).collect())
    }
}
