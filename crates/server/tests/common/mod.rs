//! Common test utilities for API testing with mocks.
//!
//! The fixture builds the real router over a real SQLite store in a temp
//! directory, with the generation client and the CMS publisher replaced by
//! controllable mocks.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use contentforge_core::testing::{fixtures, MockGenerator, MockPublisher};
use contentforge_core::{
    ArticleStore, BatchPipeline, Config, DatabaseConfig, Generator, PipelineConfig, Publisher,
    SqliteArticleStore, UploadsConfig,
};
use contentforge_server::{create_router, AppState};

/// Multipart boundary used by [`TestFixture::upload`].
const BOUNDARY: &str = "contentforge-test-boundary";

/// Test fixture for API testing with mock dependencies.
pub struct TestFixture {
    pub router: Router,
    pub generator: Arc<MockGenerator>,
    /// Present when the fixture was built with a publisher.
    pub publisher: Option<Arc<MockPublisher>>,
    pub store: Arc<SqliteArticleStore>,
    /// Holds the database and the upload directory.
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    pub with_publisher: bool,
    pub max_topics: Option<usize>,
    pub max_upload_bytes: Option<usize>,
}

impl TestConfig {
    pub fn with_publisher() -> Self {
        Self {
            with_publisher: true,
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Fixture without a publisher.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("articles.db");

        let mut config: Config = fixtures::test_config();
        config.database = DatabaseConfig {
            path: db_path.clone(),
        };
        config.uploads = UploadsConfig {
            dir: temp_dir.path().join("uploads"),
            max_bytes: test_config
                .max_upload_bytes
                .unwrap_or(UploadsConfig::default().max_bytes),
            ..UploadsConfig::default()
        };
        config.pipeline = PipelineConfig {
            max_topics: test_config.max_topics,
            ..PipelineConfig::default()
        }
        .with_concurrency_limit(3)
        .with_call_timeout(5);

        let generator = Arc::new(MockGenerator::new());
        let store =
            Arc::new(SqliteArticleStore::new(&db_path).expect("Failed to create article store"));

        let mut pipeline = BatchPipeline::new(
            config.pipeline.clone(),
            Arc::clone(&generator) as Arc<dyn Generator>,
            Arc::clone(&store) as Arc<dyn ArticleStore>,
        );

        let publisher = if test_config.with_publisher {
            let publisher = Arc::new(MockPublisher::new());
            pipeline = pipeline.with_publisher(Arc::clone(&publisher) as Arc<dyn Publisher>);
            Some(publisher)
        } else {
            None
        };

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn ArticleStore>,
            Arc::new(pipeline),
        ));
        let router = create_router(state);

        Self {
            router,
            generator,
            publisher,
            store,
            temp_dir,
        }
    }

    pub fn publisher(&self) -> &MockPublisher {
        self.publisher
            .as_deref()
            .expect("fixture was built without a publisher")
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Raw text response, e.g. for `/metrics`.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Upload a file as the `file` field of a multipart form.
    pub async fn upload(&self, filename: &str, contents: &str) -> TestResponse {
        self.upload_bytes(filename, "text/csv", contents.as_bytes())
            .await
    }

    pub async fn upload_bytes(
        &self,
        filename: &str,
        content_type: &str,
        contents: &[u8],
    ) -> TestResponse {
        let mut body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: {t}\r\n\r\n",
            b = BOUNDARY,
            f = filename,
            t = content_type
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/topics/upload")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        self.json_response(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.json_response(request).await
    }

    async fn json_response(&self, request: Request<Body>) -> TestResponse {
        let (status, body_bytes) = self.send(request).await;

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, body_bytes.to_vec())
    }
}

#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
