//! Record store tests against a real `PostgreSQL`.
//!
//! These tests require `DATABASE_URL` to point at a server where the test
//! harness may create throwaway databases.
//!
//! Run with: cargo test -p rollcall-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use rollcall_api::db::{RepositoryError, UserRepository};
use rollcall_api::models::{CreateUserRequest, NewUser, UpdateUserRequest};
use rollcall_core::{Email, PageRequest, UserId};
use sqlx::PgPool;

fn new_user(name: &str, email: &str, phone: Option<&str>) -> NewUser {
    CreateUserRequest {
        name: name.to_owned(),
        email: email.to_owned(),
        phone: phone.map(str::to_owned),
    }
    .validate()
    .unwrap()
}

// ============================================================================
// Create / Read / Delete
// ============================================================================

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_create_then_fetch_round_trip(pool: PgPool) {
    let users = UserRepository::new(&pool);

    let created = users
        .create(&new_user("Ada Lovelace", "ada@example.com", Some("555-0100")))
        .await
        .unwrap();
    assert!(created.id.as_i32() > 0);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = users.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.phone.as_deref(), Some("555-0100"));
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_missing_id_is_none(pool: PgPool) {
    let users = UserRepository::new(&pool);
    assert!(users.find_by_id(UserId::new(4242)).await.unwrap().is_none());
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_twice(pool: PgPool) {
    let users = UserRepository::new(&pool);
    let created = users
        .create(&new_user("Grace", "grace@example.com", None))
        .await
        .unwrap();

    assert!(users.delete(created.id).await.unwrap());
    assert!(!users.delete(created.id).await.unwrap());
    assert!(users.find_by_id(created.id).await.unwrap().is_none());
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_email_is_conflict(pool: PgPool) {
    let users = UserRepository::new(&pool);
    users
        .create(&new_user("First", "dup@example.com", None))
        .await
        .unwrap();

    let err = users
        .create(&new_user("Second", "dup@example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)), "got {err:?}");
}

// ============================================================================
// Update
// ============================================================================

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_partial_update_touches_only_supplied_fields(pool: PgPool) {
    let users = UserRepository::new(&pool);
    let created = users
        .create(&new_user("Alan", "alan@example.com", Some("111")))
        .await
        .unwrap();

    let changes = UpdateUserRequest {
        phone: Some(String::new()),
        ..UpdateUserRequest::default()
    }
    .validate()
    .unwrap();

    let updated = users.update(created.id, &changes).await.unwrap().unwrap();
    assert_eq!(updated.name, "Alan");
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.phone.as_deref(), Some(""));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_empty_update_returns_current_record(pool: PgPool) {
    let users = UserRepository::new(&pool);
    let created = users
        .create(&new_user("Edsger", "edsger@example.com", None))
        .await
        .unwrap();

    let unchanged = users
        .update(created.id, &UpdateUserRequest::default().validate().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged, created);

    let missing = users
        .update(UserId::new(9999), &UpdateUserRequest::default().validate().unwrap())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_update_to_taken_email_is_conflict(pool: PgPool) {
    let users = UserRepository::new(&pool);
    users
        .create(&new_user("Barbara", "barbara@example.com", None))
        .await
        .unwrap();
    let ken = users
        .create(&new_user("Ken", "ken@example.com", None))
        .await
        .unwrap();

    let changes = UpdateUserRequest {
        email: Some("barbara@example.com".to_owned()),
        ..UpdateUserRequest::default()
    }
    .validate()
    .unwrap();

    let err = users.update(ken.id, &changes).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)), "got {err:?}");
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_email_exists_can_exclude_one_user(pool: PgPool) {
    let users = UserRepository::new(&pool);
    let radia = users
        .create(&new_user("Radia", "radia@example.com", None))
        .await
        .unwrap();
    let email = Email::parse("radia@example.com").unwrap();

    assert!(users.email_exists(&email, None).await.unwrap());
    assert!(!users.email_exists(&email, Some(radia.id)).await.unwrap());
    assert!(
        !users
            .email_exists(&Email::parse("nobody@example.com").unwrap(), None)
            .await
            .unwrap()
    );
}

// ============================================================================
// List & Search
// ============================================================================

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_pagination_newest_first(pool: PgPool) {
    let users = UserRepository::new(&pool);
    let mut ids = Vec::new();
    for n in 1..=25 {
        let user = users
            .create(&new_user(&format!("User {n}"), &format!("user{n}@example.com"), None))
            .await
            .unwrap();
        ids.push(user.id);
    }
    ids.sort_unstable_by(|a, b| b.cmp(a));

    let page = users
        .find_all(PageRequest::from_query(Some("2"), Some("10")))
        .await
        .unwrap();

    assert_eq!(page.total, 25);
    assert_eq!(page.page, 2);
    assert_eq!(page.limit, 10);
    assert_eq!(page.total_pages, 3);
    let page_ids: Vec<UserId> = page.data.iter().map(|u| u.id).collect();
    assert_eq!(page_ids, ids.get(10..20).unwrap());

    let last = users
        .find_all(PageRequest::from_query(Some("3"), Some("10")))
        .await
        .unwrap();
    assert_eq!(last.data.len(), 5);

    let beyond = users
        .find_all(PageRequest::from_query(Some("9"), Some("10")))
        .await
        .unwrap();
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.total, 25);
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_empty_table_lists_nothing(pool: PgPool) {
    let page = UserRepository::new(&pool)
        .find_all(PageRequest::default())
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 0);
    assert_eq!(serde_json::to_value(&page).unwrap()["data"], serde_json::json!([]));
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_search_matches_name_or_email_case_insensitively(pool: PgPool) {
    let users = UserRepository::new(&pool);
    let by_name = users
        .create(&new_user("John Smith", "john@x.com", None))
        .await
        .unwrap();
    let by_email = users
        .create(&new_user("Jane Doe", "smith@x.com", None))
        .await
        .unwrap();
    users
        .create(&new_user("Bob Jones", "bob@x.com", None))
        .await
        .unwrap();

    let results = users.search("smith").await.unwrap();
    let ids: Vec<UserId> = results.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![by_email.id, by_name.id]);

    assert_eq!(users.search("SMITH").await.unwrap().len(), 2);
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_search_treats_wildcards_literally(pool: PgPool) {
    let users = UserRepository::new(&pool);
    users
        .create(&new_user("Plain Name", "plain@example.com", None))
        .await
        .unwrap();
    users
        .create(&new_user("100% Real", "real@example.com", None))
        .await
        .unwrap();

    assert!(users.search("_").await.unwrap().is_empty());
    assert_eq!(users.search("%").await.unwrap().len(), 1);
}

#[sqlx::test(migrator = "rollcall_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_search_is_capped(pool: PgPool) {
    let users = UserRepository::new(&pool);
    for n in 0..55 {
        users
            .create(&new_user("Capped", &format!("capped{n}@example.com"), None))
            .await
            .unwrap();
    }

    assert_eq!(users.search("capped").await.unwrap().len(), 50);
}
