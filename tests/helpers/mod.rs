//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tempfile::TempDir;

use docvault_core::config::AppConfig;
use docvault_core::types::Outcome;
use docvault_core::types::id::UserId;
use docvault_service::{Dispatcher, Services};

/// Test application over a throwaway blob root and snapshot file
pub struct TestApp {
    /// Entry point for operations
    pub dispatcher: Dispatcher,
    /// Direct service access
    pub services: Arc<Services>,
    /// Configuration the services were built from
    pub config: AppConfig,
    dir: TempDir,
}

/// Result of one dispatched operation
#[derive(Debug)]
pub struct TestResponse {
    /// `"OK"` or the error code
    pub code: String,
    /// Data on success, message on failure
    pub body: Value,
}

impl TestResponse {
    /// The data, failing the test on an error outcome
    pub fn ok(self) -> Value {
        assert_eq!(self.code, "OK", "operation failed: {}", self.body);
        self.body
    }
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = AppConfig::default();
        config.storage.root_path = dir.path().join("blobs").to_string_lossy().into_owned();
        config.database.snapshot_path =
            Some(dir.path().join("store.json").to_string_lossy().into_owned());

        let services = Services::open(&config)
            .await
            .expect("Failed to open services");
        let services = Arc::new(services);
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&services)),
            services,
            config,
            dir,
        }
    }

    /// Reopen the same blob root and snapshot, after flushing
    pub async fn reopen(self) -> Self {
        self.services.db.flush().await.expect("Failed to flush");
        let services = Arc::new(
            Services::open(&self.config)
                .await
                .expect("Failed to reopen services"),
        );
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&services)),
            services,
            config: self.config,
            dir: self.dir,
        }
    }

    /// Register a user and return its ID
    pub async fn create_test_user(&self, email: &str, first_name: &str) -> UserId {
        let body = self
            .request(
                UserId::new(),
                json!({ "op": "register_user", "email": email, "first_name": first_name }),
            )
            .await
            .ok();
        serde_json::from_value(body["id"].clone()).expect("user id")
    }

    /// Dispatch a JSON operation as `actor`
    pub async fn request(&self, actor: UserId, operation: Value) -> TestResponse {
        match self.dispatcher.dispatch_json(actor, operation).await {
            Outcome::Ok { data } => TestResponse {
                code: "OK".to_string(),
                body: data,
            },
            Outcome::Error { error, message } => TestResponse {
                code: error,
                body: Value::String(message),
            },
        }
    }

    /// Upload `content` as `filename` and return the document
    pub async fn upload(&self, actor: UserId, filename: &str, content: &[u8]) -> Value {
        self.request(
            actor,
            json!({
                "op": "upload_document",
                "filename": filename,
                "content": BASE64.encode(content),
            }),
        )
        .await
        .ok()
    }

    /// Base64 of `content`
    pub fn encode(content: &[u8]) -> String {
        BASE64.encode(content)
    }
}
