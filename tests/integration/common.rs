//! Shared test setup

use std::sync::Arc;

use library_server::{
    api,
    config::DatabaseConfig,
    repository::Repository,
    services::Services,
    AppState,
};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Services over a fresh in-memory database
pub async fn services() -> Services {
    let repository = Repository::open(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to open in-memory database");
    Services::new(repository)
}

/// Migrated SQLite file with a multi-connection pool, as the server runs it
pub async fn file_repository(dir: &TempDir) -> Repository {
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("library.db").display()),
        max_connections: 8,
        min_connections: 1,
        ..DatabaseConfig::default()
    };
    assert!(!config.is_in_memory());

    Repository::open(&config)
        .await
        .expect("Failed to open file database")
}

pub struct TestApp {
    pub base_url: String,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// POST and return the `id` of the created record
    pub async fn create(&self, path: &str, body: Value) -> i64 {
        let response = self.post_json(path, body).await;
        assert_eq!(response.status(), 201, "creating {}", path);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["id"].as_i64().expect("No id in response")
    }

    /// Author "A. Author", book "Dune" and borrower "B. Reader"
    pub async fn seed(&self) -> (i64, i64, i64) {
        let author_id = self.create("/authors", json!({ "name": "A. Author" })).await;
        let book_id = self
            .create(
                "/books",
                json!({ "title": "Dune", "author_id": author_id, "genre": "Science Fiction" }),
            )
            .await;
        let borrower_id = self
            .create(
                "/borrowers",
                json!({ "name": "B. Reader", "email": "reader@example.com" }),
            )
            .await;
        (author_id, book_id, borrower_id)
    }
}

/// Serve the real router on an ephemeral port
pub async fn spawn_app() -> TestApp {
    let state = AppState {
        services: Arc::new(services().await),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    TestApp {
        base_url: format!("http://{}/api/v1", addr),
        client: Client::new(),
    }
}
