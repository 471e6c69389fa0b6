//! HTTP endpoint for the dashboard
//!
//! Two routes, both JSON:
//! - `POST /predict`: multipart form with `image`, `patient_id`, `age`, `gender`
//! - `GET /get-reports`: every stored record

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::PredictResponse;

use crate::api::ScreeningService;
use crate::cli::DEFAULT_MAX_UPLOAD_MB;
use crate::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScreeningService>,
}

impl AppState {
    #[must_use]
    pub fn new(service: Arc<ScreeningService>) -> Self {
        Self { service }
    }
}

/// Settings for [`serve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

/// Builds the application router
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/get-reports", get(handlers::get_reports))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Binds `config.bind` and serves until the process is stopped
///
/// # Errors
///
/// Returns [`crate::PulmolensError::Io`] if the address cannot be bound or
/// the listener fails.
pub async fn serve(config: ServerConfig, service: Arc<ScreeningService>) -> Result<()> {
    let app = build_router(AppState::new(service), config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PersistencePolicy;
    use crate::model::Classifier;
    use crate::report::generate_report;
    use crate::store::{MemoryRecordStore, RecordStore};
    use crate::testing::{black_png, FailingStore, FixedClassifier};
    use crate::types::Diagnosis;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const BOUNDARY: &str = "----pulmolens-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn spawn_app(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn RecordStore>,
        policy: PersistencePolicy,
    ) -> SocketAddr {
        let service = Arc::new(ScreeningService::new(classifier, store, policy));
        let app = build_router(AppState::new(service), ServerConfig::default().max_upload_bytes);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
        addr
    }

    async fn send_raw(
        addr: SocketAddr,
        method: &str,
        path: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> (u16, String) {
        let mut stream = tokio::net::TcpStream::connect(addr)
            .await
            .expect("connect server");
        let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
        if let Some(ct) = content_type {
            req.push_str(&format!("Content-Type: {ct}\r\n"));
        }
        req.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

        let mut bytes = req.into_bytes();
        bytes.extend_from_slice(body);
        stream.write_all(&bytes).await.expect("write request");

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .expect("read response");
        let (head, body) = response
            .split_once("\r\n\r\n")
            .expect("http response must have separator");
        let status = head
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|s| s.parse::<u16>().ok())
            .expect("http status");
        (status, body.to_string())
    }

    async fn post_predict(addr: SocketAddr, parts: &[Part<'_>]) -> (u16, String) {
        let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
        send_raw(
            addr,
            "POST",
            "/predict",
            Some(&content_type),
            &multipart_body(parts),
        )
        .await
    }

    #[tokio::test]
    async fn test_predict_then_list() {
        let store = Arc::new(MemoryRecordStore::new());
        let addr = spawn_app(
            Arc::new(FixedClassifier::new(0.5)),
            store.clone(),
            PersistencePolicy::BestEffort,
        )
        .await;

        let png = black_png(224);
        let (status, body) = post_predict(
            addr,
            &[
                Part::Text("patient_id", "P-7"),
                Part::Text("age", "61"),
                Part::Text("gender", "Male"),
                Part::File("image", "chest.png", &png),
            ],
        )
        .await;

        assert_eq!(status, 200, "body: {body}");
        assert!(body.contains("\"confidence\":50.00"), "body: {body}");
        let json: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(json["diagnosis"], "NORMAL");
        assert_eq!(json["report"], generate_report(Diagnosis::Normal));

        let (status, body) = send_raw(addr, "GET", "/get-reports", None, b"").await;
        assert_eq!(status, 200);
        let records: serde_json::Value = serde_json::from_str(&body).expect("json");
        let records = records.as_array().expect("array");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["patient_id"], "P-7");
        assert_eq!(records[0]["age"], 61);
        assert_eq!(records[0]["image_name"], "chest.png");
        assert_eq!(records[0]["diagnosis"], "NORMAL");
        assert!(records[0].get("id").is_none());
    }

    #[tokio::test]
    async fn test_empty_history() {
        let addr = spawn_app(
            Arc::new(FixedClassifier::new(0.9)),
            Arc::new(MemoryRecordStore::new()),
            PersistencePolicy::BestEffort,
        )
        .await;

        let (status, body) = send_raw(addr, "GET", "/get-reports", None, b"").await;
        assert_eq!(status, 200);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_missing_image_is_bad_request() {
        let store = Arc::new(MemoryRecordStore::new());
        let addr = spawn_app(
            Arc::new(FixedClassifier::new(0.9)),
            store.clone(),
            PersistencePolicy::BestEffort,
        )
        .await;

        let (status, body) = post_predict(
            addr,
            &[
                Part::Text("patient_id", "P-7"),
                Part::Text("age", "61"),
                Part::Text("gender", "Male"),
            ],
        )
        .await;

        assert_eq!(status, 400);
        let json: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert!(json["error"].as_str().expect("message").contains("image"));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_integer_age_is_bad_request() {
        let addr = spawn_app(
            Arc::new(FixedClassifier::new(0.9)),
            Arc::new(MemoryRecordStore::new()),
            PersistencePolicy::BestEffort,
        )
        .await;

        let png = black_png(32);
        let (status, _) = post_predict(
            addr,
            &[
                Part::Text("patient_id", "P-7"),
                Part::Text("age", "sixty"),
                Part::Text("gender", "Male"),
                Part::File("image", "chest.png", &png),
            ],
        )
        .await;

        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_undecodable_image_is_unprocessable() {
        let store = Arc::new(MemoryRecordStore::new());
        let addr = spawn_app(
            Arc::new(FixedClassifier::new(0.9)),
            store.clone(),
            PersistencePolicy::BestEffort,
        )
        .await;

        let (status, body) = post_predict(
            addr,
            &[
                Part::Text("patient_id", "P-7"),
                Part::Text("age", "61"),
                Part::Text("gender", "Male"),
                Part::File("image", "notes.txt", b"definitely not pixels"),
            ],
        )
        .await;

        assert_eq!(status, 422);
        assert!(body.contains("\"error\""));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_outage() {
        let best_effort = spawn_app(
            Arc::new(FixedClassifier::new(0.875)),
            Arc::new(FailingStore),
            PersistencePolicy::BestEffort,
        )
        .await;
        let required = spawn_app(
            Arc::new(FixedClassifier::new(0.875)),
            Arc::new(FailingStore),
            PersistencePolicy::Required,
        )
        .await;

        let png = black_png(64);
        let parts = [
            Part::Text("patient_id", "P-7"),
            Part::Text("age", "61"),
            Part::Text("gender", "Female"),
            Part::File("image", "chest.png", &png),
        ];

        let (status, body) = post_predict(best_effort, &parts).await;
        assert_eq!(status, 200);
        assert!(body.contains("\"confidence\":87.50"), "body: {body}");
        assert!(body.contains("\"diagnosis\":\"PNEUMONIA\""));

        let (status, _) = post_predict(required, &parts).await;
        assert_eq!(status, 503);

        let (status, _) = send_raw(best_effort, "GET", "/get-reports", None, b"").await;
        assert_eq!(status, 503);
    }

    #[tokio::test]
    async fn test_not_multipart_is_rejected() {
        let addr = spawn_app(
            Arc::new(FixedClassifier::new(0.9)),
            Arc::new(MemoryRecordStore::new()),
            PersistencePolicy::BestEffort,
        )
        .await;

        let (status, body) = send_raw(
            addr,
            "POST",
            "/predict",
            Some("application/json"),
            b"{\"age\": 3}",
        )
        .await;
        assert_eq!(status, 400);
        assert!(body.contains("\"error\""));
    }
}
