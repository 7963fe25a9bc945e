mod common;

use common::{listing, listings, memory_store, setup, DownStore, FlakyStore, RacingStore};
use jobintel::entities::jobs;
use jobintel::jobs::persistence::{InsertOutcome, NewExternalJob};
use jobintel::jobs::{save_external_jobs, JobStore, StoreError};
use sea_orm::{EntityTrait, PaginatorTrait};

#[tokio::test]
async fn test_save_is_idempotent() {
    setup();
    let store = memory_store().await;

    for n in [0usize, 1, 7] {
        let batch = listings(&format!("source-{}", n), n);

        let first = save_external_jobs(&store, batch.clone()).await.unwrap();
        assert_eq!((first.saved, first.skipped), (n, 0));
        assert!(first.errors.is_empty());

        let second = save_external_jobs(&store, batch).await.unwrap();
        assert_eq!((second.saved, second.skipped), (0, n));
        assert!(second.errors.is_empty());
    }

    let stored = jobs::Entity::find().count(store.connection()).await.unwrap();
    assert_eq!(stored, 8);
}

#[tokio::test]
async fn test_same_url_different_source_is_distinct() {
    setup();
    let store = memory_store().await;
    let batch = vec![
        listing("remoteok", "https://acme.example/careers/42", "Rust Engineer"),
        listing("weworkremotely", "https://acme.example/careers/42", "Rust Engineer"),
    ];

    let outcome = save_external_jobs(&store, batch).await.unwrap();

    assert_eq!(outcome.saved, 2);
    assert_eq!(outcome.skipped, 0);
}

#[tokio::test]
async fn test_same_key_with_different_content_is_skipped() {
    setup();
    let store = memory_store().await;
    let mut changed = listing("remoteok", "https://acme.example/careers/42", "Senior Rust Engineer");
    changed.description = "Rewritten description".to_string();
    let batch = vec![listing("remoteok", "https://acme.example/careers/42", "Rust Engineer"), changed];

    let outcome = save_external_jobs(&store, batch).await.unwrap();

    assert_eq!(outcome.saved, 1);
    assert_eq!(outcome.skipped, 1);

    // the first record is left untouched
    let rows = jobs::Entity::find().all(store.connection()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Rust Engineer");
}

#[tokio::test]
async fn test_stored_record_fields() {
    setup();
    let store = memory_store().await;

    save_external_jobs(&store, vec![listing("arbeitnow", "https://arbeitnow.example/jobs/rust", "Rust Dev")])
        .await
        .unwrap();

    let rows = jobs::Entity::find().all(store.connection()).await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.source, jobs::SOURCE_EXTERNAL);
    assert_eq!(row.status, jobs::STATUS_OPEN);
    assert_eq!(row.source_id.as_deref(), Some("arbeitnow"));
    assert_eq!(row.external_url.as_deref(), Some("https://arbeitnow.example/jobs/rust"));
    assert_eq!(row.experience, Some(3.0));
    assert_eq!(row.tech_stack, serde_json::json!(["postgres", "rust"]));
    assert!(row.scraped_at.is_some());
}

#[tokio::test]
async fn test_batch_continues_past_failed_insert() {
    setup();
    let store = FlakyStore::new(memory_store().await, 3);

    let outcome = save_external_jobs(&store, listings("remoteok", 5)).await.unwrap();

    assert_eq!(outcome.saved, 4);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("https://jobs.example/remoteok/2"));
}

#[tokio::test]
async fn test_unique_index_violation_counts_as_skipped() {
    setup();
    let inner = memory_store().await;
    let store = RacingStore { inner: inner.clone() };
    let batch = listings("remoteok", 2);

    save_external_jobs(&store, batch.clone()).await.unwrap();
    let outcome = save_external_jobs(&store, batch).await.unwrap();

    assert_eq!(outcome.saved, 0);
    assert_eq!(outcome.skipped, 2);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn test_direct_duplicate_insert_reports_duplicate() {
    setup();
    let store = memory_store().await;
    let job = listing("remoteok", "https://remoteok.example/1", "Dev");

    let first = store.insert(NewExternalJob::from_listing(job.clone())).await.unwrap();
    let second = store.insert(NewExternalJob::from_listing(job)).await.unwrap();

    assert_eq!(first, InsertOutcome::Inserted);
    assert_eq!(second, InsertOutcome::Duplicate);
}

#[tokio::test]
async fn test_unreachable_store_fails_the_batch() {
    setup();

    let result = save_external_jobs(&DownStore, listings("remoteok", 2)).await;

    assert!(matches!(result, Err(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_empty_batch_does_not_touch_store() {
    let outcome = save_external_jobs(&DownStore, Vec::new()).await.unwrap();

    assert_eq!(outcome.saved, 0);
    assert_eq!(outcome.skipped, 0);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn test_list_open_external_newest_first() {
    setup();
    let store = memory_store().await;
    save_external_jobs(&store, listings("remoteok", 3)).await.unwrap();

    let page = store.list_open_external(2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(page[0].created_at >= page[1].created_at);

    let rest = store.list_open_external(2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
}
