//! Admin resource for user accounts.

use super::form::{FileUpload, FormSchema, Grid, Select, TextInput};
use super::resource::{Navigation, Page, Resource};
use super::table::{Action, BulkActionGroup, Column, SortDirection, TableSchema};

pub struct UserResource;

impl UserResource {
    pub const AVATAR_FIELD: &'static str = "avatar_url";
}

impl Resource for UserResource {
    const SLUG: &'static str = "users";

    fn navigation() -> Navigation {
        Navigation {
            icon: "heroicon-o-users",
            group: "User Management",
            label: "Users",
            model_label: "User",
            plural_model_label: "Users",
            sort: 11,
        }
    }

    fn form() -> FormSchema {
        FormSchema::schema(vec![
            FileUpload::make(Self::AVATAR_FIELD)
                .label("Avatar")
                .nullable()
                .image()
                .directory("avatars")
                .disk("public")
                .openable()
                .max_size(2048)
                .delete_clears_record()
                .into(),
            Grid::make(2)
                .schema(vec![
                    TextInput::make("name")
                        .label("Name")
                        .required()
                        .string()
                        .max_length(255)
                        .into(),
                    TextInput::make("username")
                        .label("Username")
                        .required()
                        .string()
                        .max_length(255)
                        .unique_ignoring_record()
                        .into(),
                    TextInput::make("email")
                        .label("Email")
                        .required()
                        .string()
                        .max_length(255)
                        .email()
                        .unique_ignoring_record()
                        .into(),
                    TextInput::make("password")
                        .label("Password")
                        .password()
                        .required_on_create()
                        .string()
                        .min_length(6)
                        .confirmed()
                        .revealable()
                        .autocomplete("new-password")
                        .dehydrated_when_filled()
                        .into(),
                    TextInput::make("password_confirmation")
                        .label("Confirm Password")
                        .password()
                        .required_on_create()
                        .string()
                        .min_length(6)
                        .revealable()
                        .not_dehydrated()
                        .into(),
                    Select::make("roles")
                        .label("Roles")
                        .nullable()
                        .multiple()
                        .relationship("roles", "name")
                        .preload()
                        .searchable()
                        .into(),
                ])
                .into(),
        ])
    }

    fn table() -> TableSchema {
        TableSchema::new()
            .default_sort("created_at", SortDirection::Desc)
            .columns(vec![
                Column::image(Self::AVATAR_FIELD)
                    .label("Avatar")
                    .sortable()
                    .searchable()
                    .size(50, 50),
                Column::text("name").label("Name").sortable().searchable(),
                Column::text("username")
                    .label("Username")
                    .sortable()
                    .searchable(),
                Column::text("email").label("Email").sortable().searchable(),
                Column::text("roles.name")
                    .label("Roles")
                    .sortable()
                    .searchable()
                    .badge(),
                Column::text("created_at")
                    .label("Created At")
                    .sortable()
                    .searchable()
                    .since_with_tooltip()
                    .toggleable(true),
                Column::text("updated_at")
                    .label("Updated At")
                    .sortable()
                    .searchable()
                    .since_with_tooltip()
                    .toggleable(true),
            ])
            .actions(vec![Action::Edit])
            .bulk_actions(vec![BulkActionGroup {
                actions: vec![Action::Delete],
            }])
    }

    fn pages(editing_enabled: bool) -> Vec<Page> {
        vec![
            Page::route("index", "/"),
            Page::route("create", "/create").enabled_if(editing_enabled),
            Page::route("edit", "/{record}/edit").enabled_if(editing_enabled),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::form::{Component, FormContext, Rule};
    use std::collections::BTreeMap;

    fn input(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_navigation() {
        let nav = UserResource::navigation();
        assert_eq!(nav.group, "User Management");
        assert_eq!(nav.sort, 11);
        assert_eq!(nav.icon, "heroicon-o-users");
    }

    #[test]
    fn test_only_index_enabled_by_default() {
        let pages = UserResource::pages(false);
        let enabled: Vec<_> = pages.iter().filter(|p| p.enabled).map(|p| p.name).collect();
        assert_eq!(enabled, vec!["index"]);

        assert!(UserResource::page_enabled("edit", true));
        assert!(!UserResource::page_enabled("edit", false));
    }

    #[test]
    fn test_form_fields() {
        let form = UserResource::form();
        let names: Vec<_> = form.fields().iter().filter_map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "avatar_url",
                "name",
                "username",
                "email",
                "password",
                "password_confirmation",
                "roles"
            ]
        );

        let upload = form.file_upload(UserResource::AVATAR_FIELD).unwrap();
        assert_eq!(upload.max_size, Some(2048));
        assert_eq!(upload.directory, "avatars");
        assert_eq!(upload.disk, "public");

        let unique: Vec<_> = form.unique_fields().iter().map(|(n, _, _)| *n).collect();
        assert_eq!(unique, vec!["username", "email"]);

        let Some(Component::TextInput(password)) = form.field("password") else {
            panic!("password should be a text input");
        };
        assert!(password.rules.contains(&Rule::MinLength(6)));
        assert!(password.rules.contains(&Rule::Confirmed));
    }

    #[test]
    fn test_create_requires_password_and_confirmation() {
        let form = UserResource::form();
        let data = input(&[
            ("name", "Jane"),
            ("username", "jane"),
            ("email", "jane@example.com"),
        ]);

        let errors = form.validate(&data, FormContext::Create).unwrap_err();
        assert!(errors.has("password"));
        assert!(errors.has("password_confirmation"));
        assert!(form.validate(&data, FormContext::Edit).is_ok());
    }

    #[test]
    fn test_short_password_rejected() {
        let form = UserResource::form();
        let data = input(&[
            ("name", "Jane"),
            ("username", "jane"),
            ("email", "jane@example.com"),
            ("password", "abc"),
            ("password_confirmation", "abc"),
        ]);

        let errors = form.validate(&data, FormContext::Create).unwrap_err();
        assert_eq!(
            errors.get("password"),
            ["The password field must be at least 6 characters."]
        );
        assert_eq!(
            errors.get("password_confirmation"),
            ["The confirm Password field must be at least 6 characters."]
        );
    }

    #[test]
    fn test_password_confirmation_never_persisted() {
        let form = UserResource::form();
        assert!(!form.dehydrates("password_confirmation", Some("secret1")));
        assert!(form.dehydrates("password", Some("secret1")));
        assert!(!form.dehydrates("password", Some("")));
    }

    #[test]
    fn test_table_columns() {
        let table = UserResource::table();
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "avatar_url",
                "name",
                "username",
                "email",
                "roles.name",
                "created_at",
                "updated_at"
            ]
        );
        assert!(table.column("created_at").unwrap().hidden_by_default());
        assert!(!table.column("email").unwrap().hidden_by_default());
        assert!(table.has_bulk_action(Action::Delete));
        assert_eq!(table.actions, vec![Action::Edit]);
        assert_eq!(table.searchable_columns().len(), 7);
    }
}
