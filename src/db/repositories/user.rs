use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::{Expr, Order, Query, SelectStatement, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    LoaderTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Serialize;
use tokio::task;

use crate::admin::SortDirection;
use crate::config::SecurityConfig;
use crate::entities::{prelude::*, role_user, roles, users};

/// Orders users by the alphabetically first role they hold.
const ROLE_NAME_SORT_EXPR: &str = "(SELECT MIN(roles.name) FROM roles \
     INNER JOIN role_user ON role_user.role_id = roles.id \
     WHERE role_user.user_id = users.id)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRef {
    pub id: i32,
    pub name: String,
}

impl From<roles::Model> for RoleRef {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// User data returned from repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub roles: Vec<RoleRef>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    fn from_model(model: users::Model, roles: Vec<roles::Model>) -> Self {
        let mut roles: Vec<RoleRef> = roles.into_iter().map(RoleRef::from).collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            id: model.id,
            name: model.name,
            username: model.username,
            email: model.email,
            avatar_url: model.avatar_url,
            roles,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub role_ids: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub username: String,
    pub email: String,
    /// `None` keeps the stored hash.
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    pub role_ids: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct UserListParams {
    pub search: Option<String>,
    /// Table columns the search term is matched against.
    pub search_columns: Vec<String>,
    pub sort: String,
    pub direction: SortDirection,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by ID, including roles
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?
        else {
            return Ok(None);
        };

        let roles = user
            .find_related(Roles)
            .all(&self.conn)
            .await
            .context("Failed to load user roles")?;

        Ok(Some(User::from_model(user, roles)))
    }

    /// Whether another user already holds `value` in a unique column.
    pub async fn value_taken(&self, field: &str, value: &str, ignore_id: Option<i32>) -> Result<bool> {
        let column = match field {
            "username" => users::Column::Username,
            "email" => users::Column::Email,
            other => anyhow::bail!("Column {other} has no uniqueness check"),
        };

        let mut query = Users::find().filter(column.eq(value));
        if let Some(id) = ignore_id {
            query = query.filter(users::Column::Id.ne(id));
        }

        let count = query
            .count(&self.conn)
            .await
            .with_context(|| format!("Failed to check uniqueness of {field}"))?;

        Ok(count > 0)
    }

    pub async fn list(&self, params: &UserListParams) -> Result<UserPage> {
        let mut query = Users::find();

        if let Some(term) = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            let condition = params
                .search_columns
                .iter()
                .filter_map(|column| search_expr(column, term))
                .fold(Condition::any(), Condition::add);
            query = query.filter(condition);
        }

        let order = match params.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        query = query
            .order_by(sort_expr(&params.sort)?, order.clone())
            .order_by(users::Column::Id, order);

        let per_page = params.per_page.max(1);
        let paginator = query.paginate(&self.conn, per_page);
        let counts = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count users")?;

        let page = params.page.max(1);
        let last_page = counts.number_of_pages.max(1);

        // Pages past the end are empty; this also keeps the row offset in range.
        if page > counts.number_of_pages {
            return Ok(UserPage {
                users: Vec::new(),
                total: counts.number_of_items,
                page,
                per_page,
                last_page,
            });
        }

        let models = paginator
            .fetch_page(page - 1)
            .await
            .context("Failed to fetch users page")?;

        let roles = models
            .load_many_to_many(Roles, RoleUser, &self.conn)
            .await
            .context("Failed to load user roles")?;

        let users = models
            .into_iter()
            .zip(roles)
            .map(|(user, roles)| User::from_model(user, roles))
            .collect();

        Ok(UserPage {
            users,
            total: counts.number_of_items,
            page,
            per_page,
            last_page,
        })
    }

    pub async fn create(&self, user: NewUser) -> Result<i32> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let result = Users::insert(users::ActiveModel {
            name: Set(user.name),
            username: Set(user.username),
            email: Set(user.email),
            password: Set(user.password_hash),
            avatar_url: Set(user.avatar_url),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        })
        .exec(&txn)
        .await
        .context("Failed to insert user")?;

        let id = result.last_insert_id;
        sync_roles(&txn, id, &user.role_ids).await?;

        txn.commit().await?;
        Ok(id)
    }

    /// Applies form changes. Returns `false` when the user does not exist.
    pub async fn update(&self, id: i32, changes: UserChanges) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let Some(user) = Users::find_by_id(id).one(&txn).await? else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.name = Set(changes.name);
        active.username = Set(changes.username);
        active.email = Set(changes.email);
        active.avatar_url = Set(changes.avatar_url);
        if let Some(hash) = changes.password_hash {
            active.password = Set(hash);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&txn).await.context("Failed to update user")?;

        sync_roles(&txn, id, &changes.role_ids).await?;

        txn.commit().await?;
        Ok(true)
    }

    pub async fn set_avatar(&self, id: i32, avatar_url: Option<String>) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(users::Column::AvatarUrl, Expr::value(avatar_url))
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update avatar")?;

        Ok(result.rows_affected > 0)
    }

    /// Stored avatar paths of the given users that have one.
    pub async fn avatar_paths(&self, ids: &[i32]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let paths: Vec<Option<String>> = Users::find()
            .select_only()
            .column(users::Column::AvatarUrl)
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to load avatar paths")?;

        Ok(paths.into_iter().flatten().collect())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        Ok(self.delete_many(&[id]).await? > 0)
    }

    pub async fn delete_many(&self, ids: &[i32]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let txn = self.conn.begin().await?;

        RoleUser::delete_many()
            .filter(role_user::Column::UserId.is_in(ids.iter().copied()))
            .exec(&txn)
            .await?;

        let result = Users::delete_many()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .exec(&txn)
            .await
            .context("Failed to delete users")?;

        txn.commit().await?;
        Ok(result.rows_affected)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Users::find().count(&self.conn).await?)
    }

    /// Verify password for a user
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, id: i32, password: &str) -> Result<bool> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?
        else {
            return Ok(false);
        };

        let password_hash = user.password;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Raw stored hash, for callers that need to compare before/after.
    pub async fn password_hash(&self, id: i32) -> Result<Option<String>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user password")?;

        Ok(user.map(|u| u.password))
    }
}

async fn sync_roles<C: ConnectionTrait>(conn: &C, user_id: i32, role_ids: &[i32]) -> Result<()> {
    RoleUser::delete_many()
        .filter(role_user::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    let mut role_ids = role_ids.to_vec();
    role_ids.sort_unstable();
    role_ids.dedup();

    if !role_ids.is_empty() {
        let links: Vec<role_user::ActiveModel> = role_ids
            .into_iter()
            .map(|role_id| role_user::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(role_id),
            })
            .collect();

        RoleUser::insert_many(links)
            .exec_without_returning(conn)
            .await
            .context("Failed to link user roles")?;
    }

    Ok(())
}

fn search_expr(column: &str, term: &str) -> Option<SimpleExpr> {
    let expr = match column {
        "name" => users::Column::Name.contains(term),
        "username" => users::Column::Username.contains(term),
        "email" => users::Column::Email.contains(term),
        "avatar_url" => users::Column::AvatarUrl.contains(term),
        "created_at" => users::Column::CreatedAt.contains(term),
        "updated_at" => users::Column::UpdatedAt.contains(term),
        "roles.name" => users::Column::Id.in_subquery(users_with_role_like(term)),
        _ => return None,
    };
    Some(expr)
}

fn users_with_role_like(term: &str) -> SelectStatement {
    Query::select()
        .column(role_user::Column::UserId)
        .from(RoleUser)
        .inner_join(
            Roles,
            Expr::col((Roles, roles::Column::Id)).equals((RoleUser, role_user::Column::RoleId)),
        )
        .and_where(Expr::col((Roles, roles::Column::Name)).like(format!("%{term}%")))
        .to_owned()
}

fn sort_expr(column: &str) -> Result<SimpleExpr> {
    let expr = match column {
        "name" => Expr::col((Users, users::Column::Name)).into(),
        "username" => Expr::col((Users, users::Column::Username)).into(),
        "email" => Expr::col((Users, users::Column::Email)).into(),
        "avatar_url" => Expr::col((Users, users::Column::AvatarUrl)).into(),
        "created_at" => Expr::col((Users, users::Column::CreatedAt)).into(),
        "updated_at" => Expr::col((Users, users::Column::UpdatedAt)).into(),
        "roles.name" => Expr::cust(ROLE_NAME_SORT_EXPR),
        other => anyhow::bail!("Cannot sort users by {other}"),
    };
    Ok(expr)
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_verifies() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };
        let hash = hash_password("secret1", Some(&config)).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(
            Argon2::default()
                .verify_password(b"secret1", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"other", &parsed).is_err());
    }

    #[test]
    fn test_sort_expr_rejects_unknown_columns() {
        assert!(sort_expr("name").is_ok());
        assert!(sort_expr("roles.name").is_ok());
        assert!(sort_expr("password").is_err());
    }

    #[test]
    fn test_search_expr_ignores_unknown_columns() {
        assert!(search_expr("email", "x").is_some());
        assert!(search_expr("roles.name", "x").is_some());
        assert!(search_expr("password", "x").is_none());
    }
}
