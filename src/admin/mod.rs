//! Declarative admin-panel resources.
//!
//! Resources describe their form, table and pages as plain data. The API
//! serves those descriptors to the frontend, and the user service runs
//! submitted state through the same form schema for validation.

pub mod form;
pub mod resource;
pub mod table;
pub mod users;

pub use form::{FormContext, FormData, FormSchema, ValidationErrors};
pub use resource::{Navigation, Resource, ResourceDescriptor};
pub use table::{SortDirection, TableSchema};
pub use users::UserResource;

/// Navigation entries for every registered resource, ordered by sort key.
#[must_use]
pub fn navigation() -> Vec<Navigation> {
    let mut items = vec![UserResource::navigation()];
    items.sort_by_key(|n| n.sort);
    items
}
