use crate::entities::{prelude::*, roles};
use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Read access to roles; role rows are managed elsewhere.
pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Roles ordered by name, optionally filtered by a name fragment.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<roles::Model>> {
        let mut query = Roles::find().order_by_asc(roles::Column::Name);

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(roles::Column::Name.contains(term));
        }

        query.all(&self.conn).await.context("Failed to list roles")
    }

    /// Ids from `ids` that have no matching role.
    pub async fn missing_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: Vec<i32> = Roles::find()
            .filter(roles::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to look up roles")?
            .into_iter()
            .map(|r| r.id)
            .collect();

        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Roles::find().count(&self.conn).await?)
    }
}
