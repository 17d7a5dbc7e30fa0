use backoffice::config::Config;
use backoffice::db::Store;
use backoffice::entities::{prelude::*, roles};
use backoffice::services::{SeaOrmUserService, UserError, UserInput, UserListQuery, UserService};
use backoffice::storage::PublicDisk;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

/// A 1x1 transparent PNG.
const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

struct TestContext {
    store: Store,
    disk: PublicDisk,
    service: SeaOrmUserService,
}

fn test_config() -> Config {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("backoffice-users-{id}.db"));
    let disk_root = std::env::temp_dir().join(format!("backoffice-public-{id}"));

    let mut config = Config::default();
    config.database.url = format!("sqlite:{}", db_path.display());
    config.storage.public_root = disk_root.display().to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.admin.enable_user_editing = true;
    config
}

async fn setup_with(config: Config) -> TestContext {
    let store = Store::new(&config.database.url)
        .await
        .expect("Failed to open test database");
    let disk = PublicDisk::from_config(&config.storage);
    let service = SeaOrmUserService::new(store.clone(), disk.clone(), &config);

    TestContext {
        store,
        disk,
        service,
    }
}

async fn setup() -> TestContext {
    setup_with(test_config()).await
}

async fn add_role(store: &Store, name: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    roles::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .expect("Failed to insert role")
    .id
}

fn input(username: &str, password: Option<&str>) -> UserInput {
    UserInput {
        name: Some(format!("{username} person")),
        username: Some(username.to_string()),
        email: Some(format!("{username}@example.com")),
        password: password.map(str::to_string),
        password_confirmation: password.map(str::to_string),
        avatar_url: None,
        roles: Vec::new(),
    }
}

fn validation_errors(err: UserError) -> backoffice::admin::ValidationErrors {
    match err {
        UserError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_user_with_roles() {
    let ctx = setup().await;
    let editor = add_role(&ctx.store, "editor").await;
    let admin = add_role(&ctx.store, "admin").await;

    let mut new_user = input("alice", Some("secret1"));
    new_user.roles = vec![editor, admin, editor];

    let user = ctx.service.create(new_user).await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    let role_names: Vec<_> = user.roles.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(role_names, vec!["admin", "editor"]);

    let repo = ctx.store.user_repo();
    assert!(repo.verify_password(user.id, "secret1").await.unwrap());
    assert!(!repo.verify_password(user.id, "wrong").await.unwrap());
    assert_ne!(
        repo.password_hash(user.id).await.unwrap().as_deref(),
        Some("secret1")
    );
}

#[tokio::test]
async fn test_duplicate_username_and_email_fail_validation() {
    let ctx = setup().await;
    ctx.service
        .create(input("alice", Some("secret1")))
        .await
        .unwrap();

    let err = ctx
        .service
        .create(input("alice", Some("secret1")))
        .await
        .unwrap_err();
    let errors = validation_errors(err);

    assert_eq!(errors.get("username"), ["The username has already been taken."]);
    assert_eq!(errors.get("email"), ["The email has already been taken."]);
    assert_eq!(ctx.store.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_requires_password() {
    let ctx = setup().await;

    let err = ctx.service.create(input("bob", None)).await.unwrap_err();
    let errors = validation_errors(err);

    assert_eq!(errors.get("password"), ["The password field is required."]);
    assert_eq!(
        errors.get("password_confirmation"),
        ["The confirm Password field is required."]
    );
    assert_eq!(ctx.store.user_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_password_confirmation_mismatch() {
    let ctx = setup().await;

    let mut new_user = input("carol", Some("secret1"));
    new_user.password_confirmation = Some("secret2".to_string());

    let err = ctx.service.create(new_user).await.unwrap_err();
    let errors = validation_errors(err);

    assert_eq!(
        errors.get("password"),
        ["The password field confirmation does not match."]
    );
}

#[tokio::test]
async fn test_edit_with_blank_password_keeps_hash() {
    let ctx = setup().await;
    let user = ctx
        .service
        .create(input("dave", Some("secret1")))
        .await
        .unwrap();
    let repo = ctx.store.user_repo();
    let before = repo.password_hash(user.id).await.unwrap();

    let mut changes = input("dave", None);
    changes.name = Some("David".to_string());
    changes.password = Some(String::new());
    changes.password_confirmation = Some(String::new());

    // username and email are unchanged, so uniqueness ignores this record
    let updated = ctx.service.update(user.id, changes).await.unwrap();

    assert_eq!(updated.name, "David");
    assert_eq!(repo.password_hash(user.id).await.unwrap(), before);
    assert!(repo.verify_password(user.id, "secret1").await.unwrap());
}

#[tokio::test]
async fn test_edit_with_new_password_replaces_hash() {
    let ctx = setup().await;
    let user = ctx
        .service
        .create(input("erin", Some("secret1")))
        .await
        .unwrap();

    ctx.service
        .update(user.id, input("erin", Some("changed1")))
        .await
        .unwrap();

    let repo = ctx.store.user_repo();
    assert!(repo.verify_password(user.id, "changed1").await.unwrap());
    assert!(!repo.verify_password(user.id, "secret1").await.unwrap());
}

#[tokio::test]
async fn test_edit_rejects_username_of_another_user() {
    let ctx = setup().await;
    ctx.service
        .create(input("frank", Some("secret1")))
        .await
        .unwrap();
    let grace = ctx
        .service
        .create(input("grace", Some("secret1")))
        .await
        .unwrap();

    let mut changes = input("grace", None);
    changes.username = Some("frank".to_string());

    let err = ctx.service.update(grace.id, changes).await.unwrap_err();
    let errors = validation_errors(err);
    assert!(errors.has("username"));
    assert!(!errors.has("email"));
}

#[tokio::test]
async fn test_update_missing_user_is_not_found() {
    let ctx = setup().await;
    let err = ctx
        .service
        .update(404, input("nobody", None))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::NotFound(404)));
}

#[tokio::test]
async fn test_unknown_role_fails_validation() {
    let ctx = setup().await;
    let mut new_user = input("heidi", Some("secret1"));
    new_user.roles = vec![999];

    let errors = validation_errors(ctx.service.create(new_user).await.unwrap_err());
    assert!(errors.has("roles"));
}

#[tokio::test]
async fn test_delete_avatar_removes_file_and_clears_field() {
    let ctx = setup().await;

    let stored = ctx
        .service
        .upload_avatar("Me.PNG", Some("image/png"), PNG)
        .await
        .unwrap();
    assert!(stored.path.starts_with("avatars/"));
    assert!(stored.path.ends_with(".png"));
    assert_eq!(stored.url, format!("/storage/{}", stored.path));
    assert!(ctx.disk.exists(&stored.path).await.unwrap());

    let mut new_user = input("ivan", Some("secret1"));
    new_user.avatar_url = Some(stored.path.clone());
    let user = ctx.service.create(new_user).await.unwrap();
    assert_eq!(user.avatar_url.as_deref(), Some(stored.path.as_str()));

    let user = ctx.service.delete_avatar(user.id).await.unwrap();

    assert!(user.avatar_url.is_none());
    assert!(user.avatar_public_url.is_none());
    assert!(!ctx.disk.exists(&stored.path).await.unwrap());
}

#[tokio::test]
async fn test_delete_avatar_tolerates_missing_file() {
    let ctx = setup().await;
    let stored = ctx
        .service
        .upload_avatar("me.png", Some("image/png"), PNG)
        .await
        .unwrap();

    let mut new_user = input("judy", Some("secret1"));
    new_user.avatar_url = Some(stored.path.clone());
    let user = ctx.service.create(new_user).await.unwrap();

    ctx.disk.delete(&stored.path).await.unwrap();

    let user = ctx.service.delete_avatar(user.id).await.unwrap();
    assert!(user.avatar_url.is_none());
}

#[tokio::test]
async fn test_avatar_upload_rejects_non_images_and_large_files() {
    let mut config = test_config();
    config.storage.avatar_max_kb = 1;
    let ctx = setup_with(config).await;

    let errors = validation_errors(
        ctx.service
            .upload_avatar("notes.txt", Some("text/plain"), b"hello")
            .await
            .unwrap_err(),
    );
    assert_eq!(errors.get("avatar_url"), ["The avatar field must be an image."]);

    let mut big = PNG.to_vec();
    big.resize(2048, 0);
    let errors = validation_errors(
        ctx.service
            .upload_avatar("big.png", Some("image/png"), &big)
            .await
            .unwrap_err(),
    );
    assert_eq!(
        errors.get("avatar_url"),
        ["The avatar field must not be greater than 1 kilobytes."]
    );
}

#[tokio::test]
async fn test_avatar_upload_rejects_svg_and_disguised_content() {
    let ctx = setup().await;
    let svg: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>";

    for (filename, content_type, bytes) in [
        ("x.svg", "image/svg+xml", svg),
        ("x.png", "image/png", b"<html><script>alert(1)</script></html>".as_slice()),
        ("x.ico", "image/x-icon", b"\0\0\x01\0\x01\0\x10\x10".as_slice()),
    ] {
        let err = ctx
            .service
            .upload_avatar(filename, Some(content_type), bytes)
            .await
            .unwrap_err();
        assert_eq!(
            validation_errors(err).get("avatar_url"),
            ["The avatar field must be an image."],
            "{filename} should be refused"
        );
    }

    let entries = std::fs::read_dir(ctx.disk.root().join("avatars"))
        .map(|dir| dir.count())
        .unwrap_or(0);
    assert_eq!(entries, 0);
}

#[tokio::test]
async fn test_describe_reports_configured_avatar_limit() {
    let mut config = test_config();
    config.storage.avatar_max_kb = 512;
    let ctx = setup_with(config).await;

    let descriptor = ctx.service.describe();
    let upload = descriptor.form.file_upload("avatar_url").unwrap();
    assert_eq!(upload.max_size, Some(512));
}

#[tokio::test]
async fn test_list_past_last_page_is_empty() {
    let ctx = setup().await;
    ctx.service.create(input("olga", Some("secret1"))).await.unwrap();

    for page in [2, u64::MAX / 2, u64::MAX] {
        let result = ctx
            .service
            .list(UserListQuery {
                page: Some(page),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.page, page);
        assert_eq!(result.total, 1);
        assert_eq!(result.last_page, 1);
    }
}

#[tokio::test]
async fn test_bulk_delete_removes_only_selected() {
    let ctx = setup().await;
    let role = add_role(&ctx.store, "editor").await;

    let mut ids = Vec::new();
    let mut avatars = Vec::new();
    for name in ["kim", "lee", "max"] {
        let stored = ctx
            .service
            .upload_avatar("me.png", Some("image/png"), PNG)
            .await
            .unwrap();
        let mut new_user = input(name, Some("secret1"));
        new_user.roles = vec![role];
        new_user.avatar_url = Some(stored.path.clone());
        ids.push(ctx.service.create(new_user).await.unwrap().id);
        avatars.push(stored.path);
    }

    let deleted = ctx.service.bulk_delete(&ids[..2]).await.unwrap();
    assert_eq!(deleted, 2);

    assert!(ctx.service.get(ids[0]).await.is_err());
    assert!(ctx.service.get(ids[1]).await.is_err());
    let survivor = ctx.service.get(ids[2]).await.unwrap();
    assert_eq!(survivor.username, "max");

    assert!(!ctx.disk.exists(&avatars[0]).await.unwrap());
    assert!(!ctx.disk.exists(&avatars[1]).await.unwrap());
    assert!(ctx.disk.exists(&avatars[2]).await.unwrap());

    let links = RoleUser::find().count(&ctx.store.conn).await.unwrap();
    assert_eq!(links, 1);
    assert_eq!(Roles::find().count(&ctx.store.conn).await.unwrap(), 1);
}

#[tokio::test]
async fn test_bulk_delete_requires_selection() {
    let ctx = setup().await;
    let err = ctx.service.bulk_delete(&[]).await.unwrap_err();
    assert!(validation_errors(err).has("ids"));
}

#[tokio::test]
async fn test_list_search_sort_and_paginate() {
    let ctx = setup().await;
    let editor = add_role(&ctx.store, "editor").await;

    for name in ["nina", "oscar", "paul"] {
        let mut new_user = input(name, Some("secret1"));
        if name == "oscar" {
            new_user.roles = vec![editor];
        }
        ctx.service.create(new_user).await.unwrap();
    }

    // default: newest first
    let page = ctx.service.list(UserListQuery::default()).await.unwrap();
    let names: Vec<_> = page.data.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["paul", "oscar", "nina"]);
    assert_eq!(page.total, 3);
    assert_eq!(page.per_page, 10);

    let page = ctx
        .service
        .list(UserListQuery {
            search: Some("edit".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].username, "oscar");

    let page = ctx
        .service
        .list(UserListQuery {
            sort: Some("username".to_string()),
            direction: Some(backoffice::admin::SortDirection::Asc),
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.last_page, 2);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].username, "paul");
}

#[tokio::test]
async fn test_list_rejects_unknown_sort_and_page_size() {
    let ctx = setup().await;

    let errors = validation_errors(
        ctx.service
            .list(UserListQuery {
                sort: Some("password".to_string()),
                per_page: Some(500),
                ..Default::default()
            })
            .await
            .unwrap_err(),
    );

    assert!(errors.has("sort"));
    assert!(errors.has("per_page"));
}

#[tokio::test]
async fn test_role_options() {
    let ctx = setup().await;
    add_role(&ctx.store, "editor").await;
    add_role(&ctx.store, "admin").await;

    let all = ctx.service.role_options(None).await.unwrap();
    let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["admin", "editor"]);

    let filtered = ctx.service.role_options(Some("edi")).await.unwrap();
    assert_eq!(filtered.len(), 1);
}
