//! Error types for pettalk-editor
//!
//! Every failure the editor can produce falls into one of the variants below.
//! Decode and extraction errors abort a pipeline immediately; poll errors are
//! absorbed by the poller up to its retry budget and only escalate as
//! `ResultTimeout`.

use thiserror::Error;

/// Main error type for the editor
#[derive(Error, Debug)]
pub enum Error {
    /// Corrupt or unsupported media container/codec
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Selection outside the decoded buffer, or start >= end
    #[error("Invalid range: {0}")]
    Range(String),

    /// Network failure or remote rejection while uploading a clip
    #[error("Upload error: {0}")]
    Upload(String),

    /// Remote result belongs to a different upload
    #[error("Correlation mismatch: expected {expected}, found {found}")]
    CorrelationMismatch { expected: String, found: String },

    /// Poll retry budget exhausted
    #[error("No analysis result after {attempts} attempts (last failure: {last_failure})")]
    ResultTimeout { attempts: u32, last_failure: String },

    /// Malformed WAV header
    #[error("WAV validation error: {0}")]
    Validation(String),

    /// Poll cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Another pipeline is already in flight
    #[error("Pipeline busy: {0}")]
    Busy(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session or blob store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// pettalk-common error
    #[error("Common error: {0}")]
    Common(#[from] pettalk_common::Error),
}

/// Convenience Result type using the editor Error
pub type Result<T> = std::result::Result<T, Error>;

/// The four failures a user is told about, each with its own message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFailure {
    UnreadableMedia,
    WrongSegmentLength,
    UploadFailed,
    AnalysisTimedOut,
}

impl UserFailure {
    pub fn message(&self) -> &'static str {
        match self {
            UserFailure::UnreadableMedia => "Your media could not be read.",
            UserFailure::WrongSegmentLength => "The selected segment is the wrong length.",
            UserFailure::UploadFailed => "Upload failed. Please check your connection.",
            UserFailure::AnalysisTimedOut => "Analysis did not complete in time. Please try again.",
        }
    }
}

impl Error {
    /// Classify this error for display.
    ///
    /// Returns `None` for failures the user caused deliberately (cancel) or
    /// that are not user-facing (busy, config, storage).
    pub fn user_failure(&self) -> Option<UserFailure> {
        match self {
            Error::Decode(_) | Error::Validation(_) => Some(UserFailure::UnreadableMedia),
            Error::Range(_) => Some(UserFailure::WrongSegmentLength),
            Error::Upload(_) => Some(UserFailure::UploadFailed),
            Error::ResultTimeout { .. } | Error::CorrelationMismatch { .. } => {
                Some(UserFailure::AnalysisTimedOut)
            }
            Error::Cancelled(_)
            | Error::Busy(_)
            | Error::Config(_)
            | Error::Storage(_)
            | Error::Io(_)
            | Error::Common(_) => None,
        }
    }
}
