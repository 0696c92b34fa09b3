//! Upload a clip and poll for its analysis
//!
//! The result endpoint only ever returns the newest record for the calling
//! user, so a record is matched to its upload by the filename the service
//! echoes back in `fileNameOrigin`. Each upload gets a timestamp-derived
//! filename, the [`CorrelationToken`].
//!
//! Polling is sequential with a fixed delay before every fetch. Fetch
//! failures, incomplete records and correlation mismatches are absorbed until
//! the attempt budget runs out.

use crate::analysis::client::{ResultService, UploadService};
use crate::analysis::store::{SessionStore, LAST_UPLOADED_FILENAME};
use crate::analysis::types::AnalysisResult;
use crate::audio::wav::WavContainer;
use crate::error::{Error, Result};
use chrono::{DateTime, Local, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upload filename used to recognize the matching result.
///
/// Derived from the local time at second resolution, so two uploads in the
/// same second share a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    /// `audio_YYYYMMDD_HHMMSS.wav` for the given time
    pub fn at(time: DateTime<Local>) -> Self {
        Self(format!(
            "audio_{}.wav",
            pettalk_common::time::timestamp_label(time)
        ))
    }

    pub fn generate() -> Self {
        Self::at(Local::now())
    }

    /// Wrap a filename recorded earlier
    pub fn from_filename(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted clip awaiting its result
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub token: CorrelationToken,
    pub submitted_at: DateTime<Utc>,
}

impl AnalysisRequest {
    pub fn new(token: CorrelationToken) -> Self {
        Self {
            token,
            submitted_at: pettalk_common::time::now(),
        }
    }
}

/// What to do when the final attempt still returns someone else's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Fail with `ResultTimeout`
    #[default]
    FailClosed,
    /// Return the mismatched record
    BestEffort,
}

impl FromStr for MismatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fail-closed" | "strict" => Ok(MismatchPolicy::FailClosed),
            "best-effort" | "lenient" => Ok(MismatchPolicy::BestEffort),
            other => Err(Error::Config(format!(
                "Unknown mismatch policy '{}' (expected fail-closed or best-effort)",
                other
            ))),
        }
    }
}

/// Attempt budget and spacing for one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_millis(1000),
        }
    }
}

pub struct ResultPoller {
    uploader: Arc<dyn UploadService>,
    results: Arc<dyn ResultService>,
    session: Arc<dyn SessionStore>,
    policy: MismatchPolicy,
}

impl ResultPoller {
    pub fn new(
        uploader: Arc<dyn UploadService>,
        results: Arc<dyn ResultService>,
        session: Arc<dyn SessionStore>,
        policy: MismatchPolicy,
    ) -> Self {
        Self {
            uploader,
            results,
            session,
            policy,
        }
    }

    pub fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    /// Upload a clip under a fresh token and remember the token.
    ///
    /// The token is written to the session store only after the upload
    /// succeeds; it replaces whatever upload was recorded before.
    pub async fn submit(&self, clip: &WavContainer) -> Result<AnalysisRequest> {
        let token = CorrelationToken::generate();
        self.submit_as(clip, token).await
    }

    /// Upload under a caller-chosen token
    pub async fn submit_as(
        &self,
        clip: &WavContainer,
        token: CorrelationToken,
    ) -> Result<AnalysisRequest> {
        let ack = self
            .uploader
            .upload(clip.as_bytes().to_vec(), token.as_str())
            .await?;
        debug!("Upload acknowledged: {}", ack.body);

        self.session.set(LAST_UPLOADED_FILENAME, token.as_str())?;
        info!("Submitted {} for analysis", token);

        Ok(AnalysisRequest::new(token))
    }

    /// The last request recorded in the session store, if any
    pub fn resume(&self) -> Result<Option<AnalysisRequest>> {
        Ok(self
            .session
            .get(LAST_UPLOADED_FILENAME)?
            .map(|filename| AnalysisRequest::new(CorrelationToken::from_filename(filename))))
    }

    /// Poll until a complete result for `request` arrives.
    ///
    /// Every attempt first waits `interval`, then fetches. A record whose
    /// `fileNameOrigin` names another upload is retried; on the final attempt
    /// the [`MismatchPolicy`] decides. A record without `fileNameOrigin` is
    /// accepted as is.
    ///
    /// # Errors
    /// - `ResultTimeout` when the budget is spent
    /// - `Cancelled` as soon as `cancel` fires
    pub async fn await_result(
        &self,
        request: &AnalysisRequest,
        settings: PollSettings,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let expected = request.token.as_str();
        let mut last_failure = String::from("no attempts made");

        for attempt in 1..=settings.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Poll for {} cancelled before attempt {}", expected, attempt);
                    return Err(Error::Cancelled(format!(
                        "poll for {} cancelled after {} attempt(s)",
                        expected,
                        attempt - 1
                    )));
                }
                _ = tokio::time::sleep(settings.interval) => {}
            }

            debug!("Result attempt {}/{} for {}", attempt, settings.max_attempts, expected);

            let result = match self.results.fetch_latest().await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    last_failure = e.to_string();
                    continue;
                }
            };

            if !result.is_complete() {
                warn!("Attempt {} returned an incomplete record", attempt);
                last_failure = "incomplete analysis record".to_string();
                continue;
            }

            match result.file_name_origin.as_deref() {
                Some(found) if found != expected => {
                    let mismatch = Error::CorrelationMismatch {
                        expected: expected.to_string(),
                        found: found.to_string(),
                    };
                    warn!("Attempt {}: {}", attempt, mismatch);
                    last_failure = mismatch.to_string();

                    if attempt < settings.max_attempts {
                        continue;
                    }
                    match self.policy {
                        MismatchPolicy::BestEffort => {
                            warn!("Returning mismatched result for {} on final attempt", expected);
                            return Ok(result);
                        }
                        MismatchPolicy::FailClosed => break,
                    }
                }
                _ => {
                    info!("Result for {} received on attempt {}", expected, attempt);
                    return Ok(result);
                }
            }
        }

        Err(Error::ResultTimeout {
            attempts: settings.max_attempts,
            last_failure,
        })
    }
}
