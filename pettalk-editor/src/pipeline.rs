//! Extraction → validation → upload → poll orchestration
//!
//! One pipeline runs at a time per [`AnalysisPipeline`]. A second `run`
//! while one is in flight fails fast with `Error::Busy` rather than queueing.

use crate::analysis::poller::{AnalysisRequest, PollSettings, ResultPoller};
use crate::analysis::store::{SessionStore, SELECTED_END_TIME, SELECTED_START_TIME};
use crate::analysis::types::{AnalysisOutcome, AnalysisResult};
use crate::audio::extract::AudioExtractionEngine;
use crate::audio::types::{MediaAsset, OutputFormat};
use crate::audio::wav::WavValidator;
use crate::error::{Error, Result};
use crate::selection::{SelectionRange, MAX_DURATION, MIN_DURATION, WIDTH_EPSILON};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A finished analysis
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub request: AnalysisRequest,
    pub result: AnalysisResult,
    pub outcome: AnalysisOutcome,
}

pub struct AnalysisPipeline {
    poller: ResultPoller,
    session: Arc<dyn SessionStore>,
    upload_format: OutputFormat,
    poll: PollSettings,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AnalysisPipeline {
    pub fn new(
        poller: ResultPoller,
        session: Arc<dyn SessionStore>,
        upload_format: OutputFormat,
        poll: PollSettings,
    ) -> Self {
        Self {
            poller,
            session,
            upload_format,
            poll,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn poller(&self) -> &ResultPoller {
        &self.poller
    }

    /// Analyze `range` of `asset`.
    ///
    /// Extraction and validation errors abort immediately; poll failures are
    /// absorbed by the poller until its budget is spent.
    pub async fn run(
        &self,
        asset: MediaAsset,
        range: SelectionRange,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy("an analysis is already running".to_string()));
        }
        let _in_flight = InFlight(&self.in_flight);

        let width = range.width();
        if width < MIN_DURATION - WIDTH_EPSILON || width > MAX_DURATION + WIDTH_EPSILON {
            return Err(Error::Range(format!(
                "segment is {:.2}s, must be {}..{}s",
                width, MIN_DURATION, MAX_DURATION
            )));
        }

        self.session.set(SELECTED_START_TIME, &range.start.to_string())?;
        self.session.set(SELECTED_END_TIME, &range.end.to_string())?;

        info!(
            "Starting analysis of {} ({:.2}s..{:.2}s)",
            asset.name, range.start, range.end
        );

        // Phase 1: extract
        let clip = AudioExtractionEngine::extract(asset, range, self.upload_format).await?;
        check_cancelled(cancel, "extraction")?;

        // Phase 2: validate
        let report = WavValidator::validate(clip.as_bytes()).into_result()?;
        info!(
            "Clip ready: {:?} Hz, {:?} channel(s), {:.2}s",
            report.sample_rate,
            report.channels,
            report.duration.unwrap_or(0.0)
        );
        check_cancelled(cancel, "validation")?;

        // Phase 3: upload
        let request = self.poller.submit(&clip).await?;

        // Phase 4: poll
        let result = self.poller.await_result(&request, self.poll, cancel).await?;
        let outcome = result.outcome();
        info!("Analysis of {} finished: {}", request.token, outcome);

        Ok(PipelineResult {
            request,
            result,
            outcome,
        })
    }
}

fn check_cancelled(cancel: &CancellationToken, phase: &str) -> Result<()> {
    if cancel.is_cancelled() {
        info!("Pipeline cancelled after {}", phase);
        return Err(Error::Cancelled(format!("cancelled after {}", phase)));
    }
    Ok(())
}
