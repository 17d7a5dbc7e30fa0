pub use super::role_user::Entity as RoleUser;
pub use super::roles::Entity as Roles;
pub use super::setting_items::Entity as SettingItems;
pub use super::settings::Entity as Settings;
pub use super::users::Entity as Users;
