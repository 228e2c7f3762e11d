use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Request, StatusCode, header},
};
use serde::de::DeserializeOwned;
use std::{
    io::Cursor,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};
use tempfile::TempDir;
use ticket_relay::{
    application::submit_ticket::use_case::SubmitTicketUseCase,
    config::{BotToken, Config, DEFAULT_ALLOWED_ORIGINS, parse_origin_list},
    domain::submission::entity::RelayMessage,
    infrastructure::{
        relay::{DocumentRelay, RelayError},
        security::{InMemoryRateLimitStore, RateLimiter, UploadPolicy},
        storage::scratch_storage::ScratchStorage,
    },
    presentation::http::{routes::create_router, state::AppState},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const FRONTEND_ORIGIN: &str = "http://127.0.0.1:5500";

/// What the fake relay saw for one call.
#[derive(Debug, Clone)]
pub struct RelayedCall {
    pub caption: String,
    pub path: PathBuf,
    pub original_name: String,
    pub file_existed: bool,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct TestRelay {
    calls: Arc<Mutex<Vec<RelayedCall>>>,
    fail: bool,
}

impl TestRelay {
    pub fn calls(&self) -> Vec<RelayedCall> {
        self.calls.lock().expect("relay log poisoned").clone()
    }
}

#[async_trait]
impl DocumentRelay for TestRelay {
    async fn send_document(&self, message: &RelayMessage) -> Result<(), RelayError> {
        let path = message.document.path.clone();
        let bytes = tokio::fs::read(&path).await.unwrap_or_default();
        self.calls.lock().expect("relay log poisoned").push(RelayedCall {
            caption: message.caption.clone(),
            file_existed: path.exists(),
            original_name: message.document.original_name.clone(),
            path,
            bytes,
        });
        if self.fail {
            return Err(RelayError::Rejected {
                status: 504,
                body: "Gateway Timeout".into(),
            });
        }
        Ok(())
    }
}

pub struct TestApp {
    pub app: Router,
    pub relay: TestRelay,
    pub scratch_dir: TempDir,
}

impl TestApp {
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        list_dir(self.scratch_dir.path())
    }
}

pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .expect("scratch dir readable")
        .map(|entry| entry.expect("dir entry").path())
        .collect()
}

pub fn build_config(upload_dir: PathBuf, rate_limit_max_requests: u32) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        bot_token: BotToken::new("test-token"),
        chat_id: "@test-channel".to_string(),
        telegram_api_base: "http://127.0.0.1:9".to_string(),
        relay_timeout_seconds: 1,
        upload_dir,
        allowed_origins: parse_origin_list(DEFAULT_ALLOWED_ORIGINS).expect("default origins"),
        frontend_origin: FRONTEND_ORIGIN.to_string(),
        rate_limit_max_requests,
        rate_limit_window_seconds: 3600,
        redis_url: None,
        trust_proxy_headers: false,
    }
}

pub async fn spawn_app_with(fail_relay: bool, rate_limit_max_requests: u32) -> TestApp {
    let scratch_dir = tempfile::tempdir().expect("failed to create scratch dir");
    let config = build_config(scratch_dir.path().to_path_buf(), rate_limit_max_requests);
    let scratch = ScratchStorage::init(&config.upload_dir)
        .await
        .expect("failed to init scratch storage");

    let relay = TestRelay {
        fail: fail_relay,
        ..TestRelay::default()
    };

    let state = AppState {
        rate_limiter: Arc::new(RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::default()),
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_seconds),
        )),
        config: Arc::new(config),
        scratch: Arc::new(scratch),
        upload_policy: UploadPolicy::default(),
        submit_ticket: Arc::new(SubmitTicketUseCase::new(Arc::new(relay.clone()))),
    };

    TestApp {
        app: create_router(state),
        relay,
        scratch_dir,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(false, 1000).await
}

pub async fn send(app: &Router, req: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(req).await.expect("request failed")
}

pub async fn read_json<T: DeserializeOwned>(res: axum::response::Response) -> T {
    let bytes = to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("failed to parse json")
}

pub async fn read_text(res: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("invalid utf8")
}

pub async fn expect_status(
    res: axum::response::Response,
    expected: http::StatusCode,
) -> axum::response::Response {
    let actual = res.status();

    if actual == expected {
        return res;
    }

    let body = read_text(res).await;
    panic!(
        "HTTP status mismatch. Expected {}, got {}. Response body: {}",
        expected, actual, body
    );
}

pub fn assert_status(status: StatusCode, expected: StatusCode) {
    assert_eq!(status, expected, "expected {}, got {}", expected, status);
}

pub fn tiny_jpeg_bytes() -> Vec<u8> {
    let uuid_bytes = *Uuid::now_v7().as_bytes();
    let raw: Vec<u8> = uuid_bytes.iter().take(12).copied().collect();
    let image = image::RgbImage::from_raw(2, 2, raw).expect("failed to create image");
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .expect("failed to encode jpeg");
    bytes
}

/// One part of a hand-built multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let boundary = format!("----relay-boundary-{}", Uuid::now_v7());
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    (boundary, body)
}

pub fn submission_parts<'a>(proof: &'a [u8], content_type: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::Text("name", "Ann"),
        Part::Text("email", "ann@x.com"),
        Part::Text("ticketsCount", "2"),
        Part::File {
            name: "proof",
            file_name: "valid.jpg",
            content_type,
            bytes: proof,
        },
    ]
}

pub fn submit_request(parts: &[Part<'_>]) -> Request<Body> {
    let (boundary, body) = multipart_body(parts);
    Request::builder()
        .method("POST")
        .uri("/api/submit-ticket")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .expect("failed to build submit request")
}

pub fn from_peer(mut req: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().expect("invalid peer address");
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}
