pub mod prelude;

pub mod role_user;
pub mod roles;
pub mod setting_items;
pub mod settings;
pub mod users;
