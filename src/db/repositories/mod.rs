pub mod role;
pub mod setting;
pub mod user;
