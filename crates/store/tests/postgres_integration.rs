//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and truncate tables between
//! tests, so they run serially. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{
    CompletedKeyPoint, ExecutionStatus, KeyPointId, Recommendation, TourExecution, TourId, UserId,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    ExecutionStore, FollowGraphStore, PostgresExecutionStore, PostgresFollowGraph, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            store::run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh pool with cleared tables
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE tour_executions, follows")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn active_execution(user: &str) -> TourExecution {
    TourExecution::start(TourId::new("tour-1"), UserId::new(user), Utc::now())
}

#[tokio::test]
#[serial]
async fn create_and_load_execution() {
    let store = PostgresExecutionStore::new(get_test_pool().await);
    let execution = active_execution("alice");

    store.create(&execution).await.unwrap();

    let loaded = store.get_by_id(execution.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, execution.id);
    assert_eq!(loaded.user_id, execution.user_id);
    assert_eq!(loaded.status, ExecutionStatus::Active);
    assert!(loaded.completed_key_points.is_empty());
    assert!(loaded.end_time.is_none());

    let active = store
        .get_active_by_user(&UserId::new("alice"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, execution.id);
}

#[tokio::test]
#[serial]
async fn partial_unique_index_rejects_second_active_execution() {
    let store = PostgresExecutionStore::new(get_test_pool().await);
    store.create(&active_execution("alice")).await.unwrap();

    let result = store.create(&active_execution("alice")).await;
    assert!(matches!(
        result,
        Err(StoreError::ActiveExecutionExists { .. })
    ));

    store.create(&active_execution("bob")).await.unwrap();
}

#[tokio::test]
#[serial]
async fn concurrent_creates_admit_exactly_one_active_execution() {
    let store = PostgresExecutionStore::new(get_test_pool().await);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.create(&active_execution("alice")).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
#[serial]
async fn update_persists_progress_and_refuses_terminal_records() {
    let store = PostgresExecutionStore::new(get_test_pool().await);
    let mut execution = active_execution("alice");
    store.create(&execution).await.unwrap();

    execution.completed_key_points.push(CompletedKeyPoint {
        key_point_id: KeyPointId::new("kp-1"),
        completion_time: Utc::now(),
    });
    execution.last_activity = Utc::now();
    store.update(&execution).await.unwrap();

    let loaded = store.get_by_id(execution.id).await.unwrap().unwrap();
    assert_eq!(loaded.completed_key_points.len(), 1);
    assert_eq!(
        loaded.completed_key_points[0].key_point_id,
        KeyPointId::new("kp-1")
    );

    execution.status = ExecutionStatus::Completed;
    execution.end_time = Some(Utc::now());
    store.update(&execution).await.unwrap();

    execution.status = ExecutionStatus::Abandoned;
    let result = store.update(&execution).await;
    assert!(matches!(result, Err(StoreError::ExecutionFinished(_))));

    let loaded = store.get_by_id(execution.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, ExecutionStatus::Completed);
    assert!(loaded.end_time.is_some());

    // The active slot is free again
    store.create(&active_execution("alice")).await.unwrap();
}

#[tokio::test]
#[serial]
async fn update_of_unknown_execution_is_not_found() {
    let store = PostgresExecutionStore::new(get_test_pool().await);
    let result = store.update(&active_execution("alice")).await;
    assert!(matches!(result, Err(StoreError::ExecutionNotFound(_))));
}

#[tokio::test]
#[serial]
async fn follow_edges_roundtrip() {
    let graph = PostgresFollowGraph::new(get_test_pool().await);
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");
    let carol = UserId::new("carol");

    graph.create_edge(&alice, &bob).await.unwrap();
    graph.create_edge(&alice, &bob).await.unwrap();
    graph.create_edge(&carol, &bob).await.unwrap();

    assert!(graph.exists(&alice, &bob).await.unwrap());
    assert!(!graph.exists(&bob, &alice).await.unwrap());
    assert_eq!(
        graph.followers(&bob).await.unwrap(),
        vec![alice.clone(), carol.clone()]
    );
    assert_eq!(graph.following(&alice).await.unwrap(), vec![bob.clone()]);

    graph.remove_edge(&alice, &bob).await.unwrap();
    assert!(!graph.exists(&alice, &bob).await.unwrap());

    let result = graph.remove_edge(&alice, &bob).await;
    assert!(matches!(
        result,
        Err(StoreError::FollowEdgeNotFound { .. })
    ));
}

#[tokio::test]
#[serial]
async fn recommendations_come_from_followees_of_followees() {
    let graph = PostgresFollowGraph::new(get_test_pool().await);
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");
    let carol = UserId::new("carol");
    let dave = UserId::new("dave");

    graph.create_edge(&alice, &bob).await.unwrap();
    graph.create_edge(&alice, &carol).await.unwrap();
    graph.create_edge(&bob, &dave).await.unwrap();
    graph.create_edge(&carol, &dave).await.unwrap();
    graph.create_edge(&bob, &UserId::new("erin")).await.unwrap();
    graph.create_edge(&bob, &carol).await.unwrap();
    graph.create_edge(&carol, &alice).await.unwrap();

    let recs = graph.recommendations(&alice, 10).await.unwrap();
    assert_eq!(
        recs,
        vec![
            Recommendation::new("dave", 2),
            Recommendation::new("erin", 1),
        ]
    );

    let recs = graph.recommendations(&alice, 1).await.unwrap();
    assert_eq!(recs.len(), 1);
}
