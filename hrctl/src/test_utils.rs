//! Test utilities for integration testing.

use crate::config::{Config, PoolSettings};
use crate::db::handlers::{Entities, Repository};
use crate::db::models::{Job, Task};
use axum_test::TestServer;
use sqlx::PgPool;

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application")
        .into_test_server()
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    config.database.pool = PoolSettings {
        max_connections: 2,
        min_connections: 0,
        ..Default::default()
    };
    config
}

pub async fn insert_task(pool: &PgPool, title: &str) -> i64 {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let task = Task {
        title: Some(title.to_string()),
        ..Default::default()
    };

    let task = Entities::<Task>::new(&mut conn)
        .insert(&task)
        .await
        .expect("Failed to create test task");
    task.id.expect("Inserted task has no id")
}

pub async fn insert_job(pool: &PgPool, title: &str) -> i64 {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let job = Job {
        job_title: Some(title.to_string()),
        ..Default::default()
    };

    let job = Entities::<Job>::new(&mut conn)
        .insert(&job)
        .await
        .expect("Failed to create test job");
    job.id.expect("Inserted job has no id")
}
