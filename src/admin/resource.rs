use serde::Serialize;

use super::form::FormSchema;
use super::table::TableSchema;

#[derive(Debug, Clone, Serialize)]
pub struct Navigation {
    pub icon: &'static str,
    pub group: &'static str,
    pub label: &'static str,
    pub model_label: &'static str,
    pub plural_model_label: &'static str,
    pub sort: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub name: &'static str,
    pub path: &'static str,
    pub enabled: bool,
}

impl Page {
    #[must_use]
    pub const fn route(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            enabled: true,
        }
    }

    #[must_use]
    pub const fn enabled_if(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// An admin-panel entry: form, table and pages for one model.
pub trait Resource {
    /// URL segment under `/api/admin`.
    const SLUG: &'static str;

    fn navigation() -> Navigation;

    fn form() -> FormSchema;

    fn table() -> TableSchema;

    fn pages(editing_enabled: bool) -> Vec<Page>;

    fn page_enabled(name: &str, editing_enabled: bool) -> bool {
        Self::pages(editing_enabled)
            .iter()
            .any(|p| p.name == name && p.enabled)
    }

    fn describe(editing_enabled: bool) -> ResourceDescriptor {
        ResourceDescriptor {
            slug: Self::SLUG,
            navigation: Self::navigation(),
            form: Self::form(),
            table: Self::table(),
            pages: Self::pages(editing_enabled),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub slug: &'static str,
    pub navigation: Navigation,
    pub form: FormSchema,
    pub table: TableSchema,
    pub pages: Vec<Page>,
}
