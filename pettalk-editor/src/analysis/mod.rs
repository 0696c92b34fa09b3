//! Remote analysis: upload, poll, correlate, route

pub mod client;
pub mod poller;
pub mod store;
pub mod types;

pub use client::{ClientConfig, EmotionApiClient, ResultService, UploadService};
pub use poller::{AnalysisRequest, CorrelationToken, MismatchPolicy, PollSettings, ResultPoller};
pub use store::{
    BlobRecord, BlobStore, FileBlobStore, FileSessionStore, MemorySessionStore, SessionStore,
    StoredBlob,
};
pub use types::{AnalysisOutcome, AnalysisResult, Emotion, UploadAck};
