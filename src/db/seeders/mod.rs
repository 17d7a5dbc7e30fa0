//! One-shot routines that load default rows.

pub mod settings;

pub use settings::SettingSeeder;
