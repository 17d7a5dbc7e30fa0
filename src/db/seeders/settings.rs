//! Default site settings.
//!
//! Every row is upserted by its unique name, so the seeder can be re-run
//! at any time: existing rows are overwritten with the values below and
//! nothing is duplicated.

use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::setting_items::SettingItemType;
use crate::entities::{prelude::*, setting_items, settings};

pub const SITE_CONFIG: &str = "Site Config";
pub const CONTACT: &str = "Contact";

const DEFAULT_META: &str = r#"<meta name="description" content="" />
    <meta property="og:title" content="SITE NAME" />
    <meta property="og:description" content="" />
    <meta property="og:type" content="website" />
    <meta property="og:url" content="https://example.com" />
    <meta property="og:image" content="" />"#;

/// A default item and the setting group it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct DefaultItem {
    pub group: &'static str,
    pub name: &'static str,
    pub key: &'static str,
    pub item_type: SettingItemType,
    pub value: Option<&'static str>,
}

pub const DEFAULT_ITEMS: [DefaultItem; 8] = [
    DefaultItem {
        group: SITE_CONFIG,
        name: "Site Name",
        key: "site_name",
        item_type: SettingItemType::Text,
        value: Some("SITE NAME"),
    },
    DefaultItem {
        group: SITE_CONFIG,
        name: "Website URL",
        key: "website_url",
        item_type: SettingItemType::Url,
        value: Some("http://127.0.0.1:8000/"),
    },
    DefaultItem {
        group: SITE_CONFIG,
        name: "Logo",
        key: "logo",
        item_type: SettingItemType::File,
        value: None,
    },
    DefaultItem {
        group: SITE_CONFIG,
        name: "Favicon",
        key: "favicon",
        item_type: SettingItemType::File,
        value: None,
    },
    DefaultItem {
        group: SITE_CONFIG,
        name: "Meta",
        key: "meta",
        item_type: SettingItemType::Textarea,
        value: Some(DEFAULT_META),
    },
    DefaultItem {
        group: CONTACT,
        name: "Address",
        key: "address",
        item_type: SettingItemType::Text,
        value: Some("Lorem ipsum dolor sit amet consectetur adipisicing elit. Ipsum, voluptas!"),
    },
    DefaultItem {
        group: CONTACT,
        name: "Email",
        key: "email",
        item_type: SettingItemType::Email,
        value: Some("example@email.com"),
    },
    DefaultItem {
        group: CONTACT,
        name: "Phone Number",
        key: "phone_number",
        item_type: SettingItemType::Number,
        value: Some("0899999999999"),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub settings: usize,
    pub items: usize,
}

pub struct SettingSeeder;

impl SettingSeeder {
    /// Upserts the default settings and their items in one transaction.
    pub async fn run(conn: &DatabaseConnection) -> Result<SeedReport> {
        let txn = conn.begin().await?;

        let site_config = upsert_setting(&txn, SITE_CONFIG).await?;
        let contact = upsert_setting(&txn, CONTACT).await?;

        for item in &DEFAULT_ITEMS {
            let setting_id = if item.group == SITE_CONFIG {
                site_config
            } else {
                contact
            };
            upsert_item(&txn, setting_id, item).await?;
        }

        txn.commit().await.context("Failed to commit settings seed")?;

        let report = SeedReport {
            settings: 2,
            items: DEFAULT_ITEMS.len(),
        };
        info!(
            settings = report.settings,
            items = report.items,
            "Settings seeded"
        );
        Ok(report)
    }
}

/// Inserts the setting if its name is new and returns its uuid either way.
async fn upsert_setting<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Uuid> {
    let now = chrono::Utc::now().to_rfc3339();

    Settings::insert(settings::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(settings::Column::Name)
            .update_column(settings::Column::UpdatedAt)
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await
    .with_context(|| format!("Failed to upsert setting {name:?}"))?;

    let setting = Settings::find()
        .filter(settings::Column::Name.eq(name))
        .one(conn)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Setting {name:?} missing after upsert"))?;

    Ok(setting.uuid)
}

async fn upsert_item<C: ConnectionTrait>(
    conn: &C,
    setting_id: Uuid,
    item: &DefaultItem,
) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();

    let (value, value_file) = if item.item_type.stores_file() {
        (None, item.value.map(str::to_string))
    } else {
        (item.value.map(str::to_string), None)
    };

    SettingItems::insert(setting_items::ActiveModel {
        setting_id: Set(setting_id),
        name: Set(item.name.to_string()),
        key: Set(item.key.to_string()),
        item_type: Set(item.item_type),
        value: Set(value),
        value_file: Set(value_file),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(setting_items::Column::Name)
            .update_columns([
                setting_items::Column::SettingId,
                setting_items::Column::Key,
                setting_items::Column::ItemType,
                setting_items::Column::Value,
                setting_items::Column::ValueFile,
                setting_items::Column::UpdatedAt,
            ])
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await
    .with_context(|| format!("Failed to upsert setting item {:?}", item.name))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_items_are_uniquely_named() {
        let mut names: Vec<_> = DEFAULT_ITEMS.iter().map(|i| i.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_file_items_have_no_text_value() {
        for item in DEFAULT_ITEMS.iter().filter(|i| i.item_type.stores_file()) {
            assert!(item.value.is_none(), "{} should start empty", item.name);
        }
    }

    #[test]
    fn test_groups() {
        let site = DEFAULT_ITEMS.iter().filter(|i| i.group == SITE_CONFIG).count();
        let contact = DEFAULT_ITEMS.iter().filter(|i| i.group == CONTACT).count();
        assert_eq!((site, contact), (5, 3));
    }
}
