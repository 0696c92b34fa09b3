//! Remote emotion analysis service client
//!
//! The service has two endpoints: an upload that accepts a WAV clip as a
//! multipart form, and a result endpoint that returns the most recent
//! analysis for the calling user. The result endpoint takes no request
//! identifier; callers correlate by the echoed filename.

use crate::analysis::types::{AnalysisResult, UploadAck};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA, REFERER};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("pettalk-editor/", env!("CARGO_PKG_VERSION"));

/// Multipart field name the upload endpoint reads the clip from
pub const UPLOAD_FIELD: &str = "bark_file";

// HTTP header names are case-insensitive; `from_static` needs lowercase.
const CLIENT_ID_HEADER: &str = "emo-client-id";
const SECRET_KEY_HEADER: &str = "emo-secret-key";
const USER_TOKEN_HEADER: &str = "x-user-token";

/// Sends a clip for analysis
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, wav: Vec<u8>, filename: &str) -> Result<UploadAck>;
}

/// Fetches the newest analysis record
#[async_trait]
pub trait ResultService: Send + Sync {
    async fn fetch_latest(&self) -> Result<AnalysisResult>;
}

/// Endpoint and credential settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub upload_path: String,
    pub result_path: String,
    pub client_id: Option<String>,
    pub secret_key: Option<String>,
    pub user_token: Option<String>,
    pub referer: Option<String>,
    pub request_timeout: Duration,
}

impl ClientConfig {
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn upload_url(&self) -> String {
        self.url(&self.upload_path)
    }

    pub fn result_url(&self) -> String {
        self.url(&self.result_path)
    }
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    data: Option<ResultPage>,
}

#[derive(Debug, Deserialize)]
struct ResultPage {
    #[serde(default)]
    content: Vec<AnalysisResult>,
}

/// reqwest-backed client for both endpoints
pub struct EmotionApiClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl EmotionApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .default_headers(credential_headers(&config)?)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn credential_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let pairs: [(&'static str, Option<&str>); 3] = [
        (CLIENT_ID_HEADER, config.client_id.as_deref()),
        (SECRET_KEY_HEADER, config.secret_key.as_deref()),
        (USER_TOKEN_HEADER, config.user_token.as_deref()),
    ];
    for (name, value) in pairs {
        if let Some(value) = value {
            headers.insert(HeaderName::from_static(name), header_value(name, value)?);
        }
    }
    if let Some(referer) = config.referer.as_deref() {
        headers.insert(REFERER, header_value("Referer", referer)?);
    }
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Config(format!("Invalid value for header {}: {}", name, e)))
}

#[async_trait]
impl UploadService for EmotionApiClient {
    async fn upload(&self, wav: Vec<u8>, filename: &str) -> Result<UploadAck> {
        let size = wav.len();
        let part = Part::bytes(wav)
            .file_name(filename.to_string())
            .mime_str("audio/wav")
            .map_err(|e| Error::Upload(e.to_string()))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        tracing::debug!(filename = %filename, bytes = size, "Uploading clip");

        let response = self
            .http_client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!(
                "Server returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Upload(format!("Malformed upload response: {}", e)))?;

        tracing::info!(filename = %filename, "Clip uploaded");

        Ok(UploadAck {
            filename: filename.to_string(),
            body,
        })
    }
}

#[async_trait]
impl ResultService for EmotionApiClient {
    async fn fetch_latest(&self) -> Result<AnalysisResult> {
        let cache_buster = pettalk_common::time::unix_millis().to_string();

        let response = self
            .http_client
            .get(self.config.result_url())
            .query(&[("t", cache_buster.as_str())])
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0")
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upload(format!(
                "Result endpoint returned {}",
                status.as_u16()
            )));
        }

        let envelope: ResultEnvelope = response
            .json()
            .await
            .map_err(|e| Error::Upload(format!("Malformed result response: {}", e)))?;

        envelope
            .data
            .and_then(|page| page.content.into_iter().next())
            .ok_or_else(|| Error::Upload("No analysis results available".to_string()))
    }
}
