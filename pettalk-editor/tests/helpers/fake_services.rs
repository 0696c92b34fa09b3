//! In-memory stand-ins for the remote service
//!
//! Used where tests need exact control over poll responses or a paused
//! clock; the HTTP client itself is exercised against `mock_service`.

use async_trait::async_trait;
use pettalk_editor::analysis::{AnalysisResult, ResultService, UploadAck, UploadService};
use pettalk_editor::{Error, Result};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One scripted reply from the result endpoint
#[derive(Debug, Clone)]
pub enum Step {
    Record(AnalysisResult),
    Fail(String),
}

/// Complete record with the given fields
pub fn record(dog: &str, filter: &str, origin: Option<&str>) -> Step {
    Step::Record(AnalysisResult {
        ans_dog: Some(dog.to_string()),
        ans_filter: Some(filter.to_string()),
        file_name_origin: origin.map(str::to_string),
        start_time: None,
        end_time: None,
    })
}

/// Record missing its classification fields
pub fn incomplete() -> Step {
    Step::Record(AnalysisResult::default())
}

/// Plays back a fixed script; the last step repeats once the script ends
pub struct ScriptedResults {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: AtomicUsize,
}

impl ScriptedResults {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultService for ScriptedResults {
    async fn fetch_latest(&self) -> Result<AnalysisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut steps = self.steps.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match steps.pop_front() {
                Some(step) => {
                    *last = Some(step.clone());
                    step
                }
                None => last
                    .clone()
                    .unwrap_or_else(|| Step::Fail("no scripted response".to_string())),
            }
        };
        match step {
            Step::Record(result) => Ok(result),
            Step::Fail(message) => Err(Error::Upload(message)),
        }
    }
}

/// Records uploads; optionally rejects them
#[derive(Default)]
pub struct RecordingUploader {
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub reject_with: Option<String>,
}

impl RecordingUploader {
    pub fn rejecting(message: &str) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            reject_with: Some(message.to_string()),
        }
    }

    pub fn filenames(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl UploadService for RecordingUploader {
    async fn upload(&self, wav: Vec<u8>, filename: &str) -> Result<UploadAck> {
        if let Some(message) = &self.reject_with {
            return Err(Error::Upload(message.clone()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((filename.to_string(), wav.len()));
        Ok(UploadAck {
            filename: filename.to_string(),
            body: json!({"success": true}),
        })
    }
}
