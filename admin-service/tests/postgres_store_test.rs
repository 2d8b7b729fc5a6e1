//! Postgres store tests. Run with a disposable database:
//! `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`

use admin_service::config::DatabaseConfig;
use admin_service::models::{Admin, AdminField, NewAdmin, ProviderType};
use admin_service::services::{AdminStore, Database, ProviderError, RequestContext, StoreError};
use chrono::Utc;
use futures::future::{self, FutureExt};
use tokio_test::assert_ok;
use uuid::Uuid;

async fn database() -> Database {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run Postgres store tests");
    let db = Database::new(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
    })
    .await
    .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

fn new_admin() -> Admin {
    let unique = Uuid::new_v4().simple().to_string();
    Admin::new(
        NewAdmin {
            id: unique.clone(),
            provider_subject: format!("subject-{}", unique),
            provider_type: ProviderType::Email,
            email: format!("{}@example.com", unique),
            phone_number: Some("09012345678".to_string()),
        },
        Utc::now(),
    )
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn create_get_and_project() {
    let db = database().await;
    let ctx = RequestContext::background();
    let admin = new_admin();

    assert_ok!(db.create(&ctx, &admin, future::ready(Ok(())).boxed()).await);

    let stored = db.get(&ctx, &admin.id, &[]).await.unwrap();
    assert_eq!(stored.email, admin.email);
    assert_eq!(stored.provider_type, ProviderType::Email);
    assert_eq!(stored.phone_number.as_deref(), Some("09012345678"));
    assert!(stored.verified_at.is_none());

    let projected = db
        .get_by_email(&ctx, &admin.email, &[AdminField::Id])
        .await
        .unwrap();
    assert_eq!(projected.id, admin.id);
    assert!(projected.email.is_empty());

    let by_subject = db
        .get_by_provider_subject(&ctx, &admin.provider_subject, &[])
        .await
        .unwrap();
    assert_eq!(by_subject.id, admin.id);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn failed_hook_rolls_back_insert() {
    let db = database().await;
    let ctx = RequestContext::background();
    let admin = new_admin();

    let err = db
        .create(
            &ctx,
            &admin,
            future::ready(Err(ProviderError::Unknown("boom".to_string()))).boxed(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Hook(ProviderError::Unknown(_))));
    assert!(db.get(&ctx, &admin.id, &[]).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn duplicate_email_already_exists() {
    let db = database().await;
    let ctx = RequestContext::background();
    let admin = new_admin();
    assert_ok!(db.create(&ctx, &admin, future::ready(Ok(())).boxed()).await);

    let mut duplicate = new_admin();
    duplicate.email = admin.email.clone();
    let err = db
        .create(&ctx, &duplicate, future::ready(Ok(())).boxed())
        .await
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn verified_at_is_set_once() {
    let db = database().await;
    let ctx = RequestContext::background();
    let admin = new_admin();
    assert_ok!(db.create(&ctx, &admin, future::ready(Ok(())).boxed()).await);

    assert_ok!(db.update_verified_at(&ctx, &admin.id).await);
    let first = db.get(&ctx, &admin.id, &[]).await.unwrap().verified_at;
    assert!(first.is_some());

    assert_ok!(db.update_verified_at(&ctx, &admin.id).await);
    let second = db.get(&ctx, &admin.id, &[]).await.unwrap().verified_at;
    assert_eq!(first, second);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn soft_delete_hides_record_and_frees_email() {
    let db = database().await;
    let ctx = RequestContext::background();
    let admin = new_admin();
    assert_ok!(db.create(&ctx, &admin, future::ready(Ok(())).boxed()).await);

    let err = db
        .delete(
            &ctx,
            &admin.id,
            future::ready(Err(ProviderError::Unknown("boom".to_string()))).boxed(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Hook(_)));
    assert!(db.get(&ctx, &admin.id, &[]).await.is_ok());

    assert_ok!(db.delete(&ctx, &admin.id, future::ready(Ok(())).boxed()).await);
    assert!(db.get(&ctx, &admin.id, &[]).await.unwrap_err().is_not_found());

    let mut again = new_admin();
    again.email = admin.email.clone();
    assert_ok!(db.create(&ctx, &again, future::ready(Ok(())).boxed()).await);
}
