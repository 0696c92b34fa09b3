//! In-process HTTP mock of the emotion analysis service
//!
//! Serves the upload and result endpoints on an ephemeral localhost port and
//! records every request so tests can assert on headers and payloads.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pettalk_editor::analysis::ClientConfig;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const UPLOAD_PATH: &str = "/emo2/v1/analysis/request";
pub const RESULT_PATH: &str = "/emo2/v1/analysis/result";

/// What the upload endpoint received
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub field_name: Option<String>,
    pub filename: Option<String>,
    pub part_content_type: Option<String>,
    pub headers: HashMap<String, String>,
    pub body_len: usize,
}

/// What the result endpoint received
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
}

/// How the upload endpoint answers
#[derive(Debug, Clone)]
pub enum UploadReply {
    Json(Value),
    Status(u16, String),
    /// 200 with a body that is not JSON
    Garbage,
}

/// How the result endpoint answers once its queue is empty
#[derive(Debug, Clone)]
pub enum ResultFallback {
    Status(u16),
    /// Complete record echoing the last uploaded filename
    EchoUpload { ans_dog: String, ans_filter: String },
}

pub struct MockState {
    pub upload_reply: UploadReply,
    /// Full response bodies served in order before the fallback applies
    pub result_bodies: VecDeque<Value>,
    pub fallback: ResultFallback,
    pub uploads: Vec<RecordedUpload>,
    pub queries: Vec<RecordedQuery>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            upload_reply: UploadReply::Json(json!({"success": true, "code": 200})),
            result_bodies: VecDeque::new(),
            fallback: ResultFallback::Status(503),
            uploads: Vec::new(),
            queries: Vec::new(),
        }
    }
}

pub type SharedMock = Arc<Mutex<MockState>>;

/// Wrap records the way the service pages them
pub fn content(records: Vec<Value>) -> Value {
    json!({"data": {"content": records}})
}

/// A running mock service
pub struct MockService {
    pub addr: SocketAddr,
    pub state: SharedMock,
}

impl MockService {
    pub async fn start(state: MockState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route(UPLOAD_PATH, post(upload))
            .route(RESULT_PATH, get(result))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url(),
            upload_path: UPLOAD_PATH.to_string(),
            result_path: RESULT_PATH.to_string(),
            client_id: Some("test-client".to_string()),
            secret_key: Some("test-secret".to_string()),
            user_token: Some("test_dog_8".to_string()),
            referer: Some("http://localhost".to_string()),
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.state.lock().unwrap().queries.clone()
    }
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect()
}

/// Pull `key="value"` out of a multipart part header
fn quoted_attr(text: &str, key: &str) -> Option<String> {
    let needle = format!("{}=\"", key);
    let start = text.find(&needle)? + needle.len();
    let len = text[start..].find('"')?;
    Some(text[start..start + len].to_string())
}

async fn upload(State(state): State<SharedMock>, headers: HeaderMap, body: Bytes) -> Response {
    // Part headers are ASCII; lossy decoding is enough to find them
    let text = String::from_utf8_lossy(&body);
    let disposition = text
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("content-disposition"))
        .unwrap_or_default()
        .to_string();
    let part_content_type = text
        .lines()
        .filter(|l| l.to_ascii_lowercase().starts_with("content-type"))
        .map(|l| l.splitn(2, ':').nth(1).unwrap_or_default().trim().to_string())
        .next();

    let mut state = state.lock().unwrap();
    state.uploads.push(RecordedUpload {
        field_name: quoted_attr(&disposition, "name"),
        filename: quoted_attr(&disposition, "filename"),
        part_content_type,
        headers: header_map(&headers),
        body_len: body.len(),
    });

    match state.upload_reply.clone() {
        UploadReply::Json(value) => Json(value).into_response(),
        UploadReply::Status(code, text) => {
            (StatusCode::from_u16(code).unwrap(), text).into_response()
        }
        UploadReply::Garbage => (StatusCode::OK, "<html>ok</html>").into_response(),
    }
}

async fn result(
    State(state): State<SharedMock>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.queries.push(RecordedQuery {
        params,
        headers: header_map(&headers),
    });

    if let Some(body) = state.result_bodies.pop_front() {
        return Json(body).into_response();
    }

    match state.fallback.clone() {
        ResultFallback::Status(code) => StatusCode::from_u16(code).unwrap().into_response(),
        ResultFallback::EchoUpload {
            ans_dog,
            ans_filter,
        } => {
            let origin = state
                .uploads
                .last()
                .and_then(|u| u.filename.clone())
                .unwrap_or_default();
            Json(content(vec![json!({
                "ansDog": ans_dog,
                "ansFilter": ans_filter,
                "fileNameOrigin": origin,
                "startTime": "0",
                "endTime": "7"
            })]))
            .into_response()
        }
    }
}
