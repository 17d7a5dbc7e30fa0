use crate::entities::{prelude::*, setting_items, settings};
use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, LoaderTrait, PaginatorTrait, QueryOrder};

/// A setting group with its items.
pub type SettingWithItems = (settings::Model, Vec<setting_items::Model>);

pub struct SettingRepository {
    conn: DatabaseConnection,
}

impl SettingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Settings ordered by name, each with its items ordered by id.
    pub async fn list_with_items(&self) -> Result<Vec<SettingWithItems>> {
        let groups = Settings::find()
            .order_by_asc(settings::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list settings")?;

        let items = groups
            .load_many(
                SettingItems::find().order_by_asc(setting_items::Column::Id),
                &self.conn,
            )
            .await
            .context("Failed to load setting items")?;

        Ok(groups.into_iter().zip(items).collect())
    }

    pub async fn count_settings(&self) -> Result<u64> {
        Ok(Settings::find().count(&self.conn).await?)
    }

    pub async fn count_items(&self) -> Result<u64> {
        Ok(SettingItems::find().count(&self.conn).await?)
    }
}
