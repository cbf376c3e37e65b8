//! End-to-end tests of the retrieval service against file-backed databases.

mod common;

use anyhow::Result;
use common::{KeywordEmbedder, temp_database, users_database};
use querymax_retriever::retrieval::synthesize;
use querymax_retriever::{RetrievalError, RetrievalService, ServiceState, demo};
use std::sync::Arc;
use std::time::Duration;

fn service_for(
    db: &querymax_retriever::storage::database::Database,
) -> (Arc<KeywordEmbedder>, RetrievalService) {
    let embedder = Arc::new(KeywordEmbedder::new());
    let service = RetrievalService::with_database(db, embedder.clone(), 6);
    (embedder, service)
}

fn index_texts(service_index: &querymax_retriever::retrieval::VectorIndex) -> Vec<String> {
    (0..service_index.len())
        .filter_map(|i| service_index.text(i).map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_users_table_end_to_end() -> Result<()> {
    let (_dir, db) = users_database().await?;
    let (_embedder, service) = service_for(&db);
    service.startup().await?;

    let report = service.rebuild_from_schema().await?;
    assert_eq!(report.documents_indexed, 4);
    assert_eq!(report.embedding_dim, common::VOCABULARY.len());

    let index = service.current_index().await.unwrap();
    assert_eq!(
        index_texts(&index),
        vec![
            "Table users: columns = [id, name, city]",
            "Column users.id: type=INTEGER",
            "Column users.name: type=TEXT",
            "Column users.city: type=TEXT",
        ]
    );

    let results = service.retrieve("which city", Some(1)).await?;
    assert_eq!(results, vec!["Column users.city: type=TEXT"]);

    Ok(())
}

#[tokio::test]
async fn test_document_count_matches_schema() -> Result<()> {
    let (_dir, db) = temp_database().await?;
    demo::init_schema(db.pool()).await?;
    let (_embedder, service) = service_for(&db);

    let context = service.get_schema_context().await?;
    let expected: usize = context
        .snapshot
        .tables
        .values()
        .map(|t| 1 + t.columns.len())
        .sum();

    let report = service.rebuild_from_schema().await?;
    assert_eq!(report.documents_indexed, expected);
    assert_eq!(report.documents_indexed, 58);
    assert_eq!(service.stats().await?.documents, expected);

    // Bookkeeping tables never show up as documents
    let index = service.current_index().await.unwrap();
    assert!(index_texts(&index).iter().all(|t| !t.contains("rag_")));

    let results = service.retrieve("email of users", Some(1)).await?;
    assert_eq!(results, vec!["Column users.email: type=TEXT"]);

    Ok(())
}

#[tokio::test]
async fn test_rebuild_is_idempotent() -> Result<()> {
    let (_dir, db) = temp_database().await?;
    demo::init_schema(db.pool()).await?;
    let (_embedder, service) = service_for(&db);

    let first = service.rebuild_from_schema().await?;
    let first_texts = index_texts(&service.current_index().await.unwrap());
    let first_hash = service.stats().await?.last_hash;

    let second = service.rebuild_from_schema().await?;
    let second_texts = index_texts(&service.current_index().await.unwrap());

    assert_eq!(first.documents_indexed, second.documents_indexed);
    assert_eq!(first.embedding_dim, second.embedding_dim);
    assert_eq!(first_texts, second_texts);
    assert_eq!(service.stats().await?.last_hash, first_hash);

    let context = service.get_schema_context().await?;
    let synthesized: Vec<String> = synthesize(&context.snapshot)
        .into_iter()
        .map(|d| d.text)
        .collect();
    assert_eq!(synthesized, second_texts);

    Ok(())
}

#[tokio::test]
async fn test_restart_loads_persisted_corpus() -> Result<()> {
    let (dir, db) = users_database().await?;
    {
        let (_embedder, service) = service_for(&db);
        service.rebuild_from_schema().await?;
    }
    db.close().await;

    let db = querymax_retriever::storage::database::Database::open(&dir.path().join("database.db")).await?;
    let (embedder, service) = service_for(&db);
    assert_eq!(service.state().await, ServiceState::Uninitialized);

    service.startup().await?;
    assert_eq!(service.state().await, ServiceState::IndexLoaded);
    assert_eq!(embedder.calls(), 0);

    let stats = service.stats().await?;
    assert_eq!(stats.documents, 4);
    assert_eq!(stats.embed_dim, common::VOCABULARY.len());
    assert_eq!(stats.last_hash, Some(service.get_schema_context().await?.hash));

    assert_eq!(
        service.retrieve("which city", Some(1)).await?,
        vec!["Column users.city: type=TEXT"]
    );
    assert_eq!(embedder.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_empty_corpus_never_calls_embedder() -> Result<()> {
    let (_dir, db) = temp_database().await?;
    let (embedder, service) = service_for(&db);
    embedder.set_failing(true);

    // Before startup
    assert!(service.retrieve("anything", Some(3)).await?.is_empty());

    service.startup().await?;
    for k in [0, 1, 10] {
        assert!(service.retrieve("anything", Some(k)).await?.is_empty());
    }

    // Empty schema rebuild needs no embeddings either
    let report = service.rebuild_from_schema().await?;
    assert_eq!(report.documents_indexed, 0);
    assert!(service.retrieve("anything", None).await?.is_empty());
    assert_eq!(embedder.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_embedding_failure_keeps_previous_index() -> Result<()> {
    let (_dir, db) = users_database().await?;
    let (embedder, service) = service_for(&db);
    service.rebuild_from_schema().await?;
    let before = service.current_index().await.unwrap();
    let hash_before = service.stats().await?.last_hash;

    sqlx::query("CREATE TABLE orders (order_id INTEGER, total_amount REAL)")
        .execute(db.pool())
        .await?;
    embedder.set_failing(true);

    let err = service.rebuild_from_schema().await.unwrap_err();
    assert!(matches!(err, RetrievalError::EmbeddingUnavailable { .. }));
    assert_eq!(err.operation(), Some("rebuild_from_schema"));

    assert!(Arc::ptr_eq(&before, &service.current_index().await.unwrap()));
    let stats = service.stats().await?;
    assert_eq!(stats.documents, 4);
    assert_eq!(stats.last_hash, hash_before);

    // Retrieval failures surface instead of returning stale or empty results
    let err = service.retrieve("which city", Some(1)).await.unwrap_err();
    assert_eq!(err.operation(), Some("retrieve"));

    embedder.set_failing(false);
    assert_eq!(service.rebuild_from_schema().await?.documents_indexed, 7);

    Ok(())
}

#[tokio::test]
async fn test_store_failure_keeps_previous_index() -> Result<()> {
    let (_dir, db) = users_database().await?;
    let (_embedder, service) = service_for(&db);
    service.rebuild_from_schema().await?;
    let before = service.current_index().await.unwrap();

    sqlx::query("DROP TABLE rag_documents").execute(db.pool()).await?;

    let err = service.rebuild_from_schema().await.unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::StoreUnavailable {
            operation: "replace_all",
            ..
        }
    ));
    assert!(Arc::ptr_eq(&before, &service.current_index().await.unwrap()));
    assert_eq!(
        service.retrieve("which city", Some(1)).await?,
        vec!["Column users.city: type=TEXT"]
    );

    Ok(())
}

#[tokio::test]
async fn test_schema_change_needs_explicit_rebuild() -> Result<()> {
    let (_dir, db) = users_database().await?;
    let (_embedder, service) = service_for(&db);
    service.startup().await?;
    service.rebuild_from_schema().await?;
    let before = service.get_schema_context().await?;

    sqlx::query("CREATE TABLE orders (order_id INTEGER, user_id INTEGER, total_amount REAL)")
        .execute(db.pool())
        .await?;

    let after = service.get_schema_context().await?;
    assert_ne!(before.hash, after.hash);
    assert!(after.snapshot.tables.contains_key("orders"));
    assert!(after.text.starts_with("orders(order_id INTEGER, user_id INTEGER, total_amount REAL) ; users("));

    // Retrieval still serves the old corpus
    let all = service.retrieve("orders total amount", Some(100)).await?;
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|t| !t.contains("orders")));
    assert_eq!(service.stats().await?.last_hash, Some(before.hash));

    service.rebuild_from_schema().await?;
    let top = service.retrieve("orders total amount", Some(1)).await?;
    assert_eq!(top, vec!["Column orders.total_amount: type=REAL"]);
    assert_eq!(service.stats().await?.last_hash, Some(after.hash));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_retrieve_sees_whole_generations() -> Result<()> {
    let (_dir, db) = users_database().await?;
    let embedder = Arc::new(KeywordEmbedder::new());
    let service = Arc::new(RetrievalService::with_database(&db, embedder.clone(), 100));
    service.startup().await?;
    service.rebuild_from_schema().await?;

    let question = "which city is the users name";
    let before = service.retrieve(question, None).await?;

    sqlx::query("CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT, city TEXT)")
        .execute(db.pool())
        .await?;
    embedder.set_delay(Duration::from_millis(20));

    let rebuild = {
        let service = service.clone();
        tokio::spawn(async move { service.rebuild_from_schema().await })
    };

    let readers = (0..24).map(|i| {
        let service = service.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(i * 3)).await;
            service.retrieve(question, None).await
        }
    });
    let observed = futures::future::join_all(readers).await;

    let report = rebuild.await??;
    assert_eq!(report.documents_indexed, 8);
    let after = service.retrieve(question, None).await?;
    assert_ne!(before, after);

    for result in observed {
        let result = result?;
        assert!(
            result == before || result == after,
            "retrieve returned a mixed generation: {result:?}"
        );
    }

    let index = service.current_index().await.unwrap();
    for position in 0..index.len() {
        assert!(index.text(position).is_some());
        assert!(index.meta(position).is_some());
        assert_eq!(index.row(position).unwrap().len(), index.dimension());
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_rebuilds_are_serialized() -> Result<()> {
    let (_dir, db) = temp_database().await?;
    demo::init_schema(db.pool()).await?;
    let embedder = Arc::new(KeywordEmbedder::new());
    embedder.set_delay(Duration::from_millis(10));
    let service = Arc::new(RetrievalService::with_database(&db, embedder, 6));

    let rebuilds = (0..3).map(|_| {
        let service = service.clone();
        async move { service.rebuild_from_schema().await }
    });
    for report in futures::future::join_all(rebuilds).await {
        assert_eq!(report?.documents_indexed, 58);
    }
    assert_eq!(service.stats().await?.documents, 58);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_startup_during_rebuild_keeps_newest_generation() -> Result<()> {
    let (_dir, db) = users_database().await?;
    let embedder = Arc::new(KeywordEmbedder::new());
    let service = Arc::new(RetrievalService::with_database(&db, embedder.clone(), 100));
    service.rebuild_from_schema().await?;

    sqlx::query("CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT, city TEXT)")
        .execute(db.pool())
        .await?;
    embedder.set_delay(Duration::from_millis(30));

    let rebuild = {
        let service = service.clone();
        tokio::spawn(async move { service.rebuild_from_schema().await })
    };
    let startups = (0..8).map(|i| {
        let service = service.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(i * 5)).await;
            service.startup().await
        }
    });
    for result in futures::future::join_all(startups).await {
        result?;
    }
    assert_eq!(rebuild.await??.documents_indexed, 8);

    let index = service.current_index().await.unwrap();
    let stats = service.stats().await?;
    assert_eq!(index.len(), 8);
    assert_eq!(stats.documents, index.len());
    assert_eq!(stats.last_hash, Some(service.get_schema_context().await?.hash));

    Ok(())
}
