use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "setting_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub setting_id: Uuid,

    #[sea_orm(unique)]
    pub name: String,

    pub key: String,

    #[sea_orm(column_name = "type")]
    pub item_type: SettingItemType,

    #[sea_orm(column_type = "Text", nullable)]
    pub value: Option<String>,

    /// Public disk path, only used by `file` items
    pub value_file: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

/// Input widget an item is edited with; also decides whether the item
/// stores `value` or `value_file`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum SettingItemType {
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "url")]
    Url,
    #[sea_orm(string_value = "file")]
    File,
    #[sea_orm(string_value = "textarea")]
    Textarea,
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "number")]
    Number,
}

impl SettingItemType {
    #[must_use]
    pub const fn stores_file(self) -> bool {
        matches!(self, Self::File)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::settings::Entity",
        from = "Column::SettingId",
        to = "super::settings::Column::Uuid",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Setting,
}

impl Related<super::settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Setting.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
