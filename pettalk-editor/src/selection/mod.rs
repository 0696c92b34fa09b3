//! Segment selection
//!
//! A selection is the `[start, end]` window (seconds) the user picks inside a
//! media file. The selector turns pointer deltas into a valid window; the
//! preview renderers draw the window over a waveform or thumbnail strip.

pub mod preview;
pub mod selector;

pub use preview::{
    PreviewWindow, RenderedPreview, SelectionPreview, ThumbnailFrame, ThumbnailStrip,
    WaveformPreview,
};
pub use selector::{DragState, Handle, SegmentSelector};

/// Shortest window that may be submitted (seconds)
pub const MIN_DURATION: f64 = 7.0;

/// Longest window that may be submitted (seconds)
pub const MAX_DURATION: f64 = 10.0;

/// Slack for comparisons on accumulated floating point widths
pub(crate) const WIDTH_EPSILON: f64 = 1e-9;

/// A time window inside a media file, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRange {
    pub start: f64,
    pub end: f64,
}

impl SelectionRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    /// Where playback should resume from.
    ///
    /// A playhead outside `[start, end)` jumps back to `start`.
    pub fn playhead_for(&self, current: f64) -> f64 {
        if current < self.start || current >= self.end {
            self.start
        } else {
            current
        }
    }
}

/// Whether the current window may be submitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionStatus {
    /// Width within `[MIN_DURATION, MAX_DURATION]`
    Ready,
    /// Width is short of the minimum by this many seconds
    TooShort { by: f64 },
    /// Width exceeds the maximum by this many seconds
    TooLong { by: f64 },
    /// Media has no usable duration; nothing can be selected
    Unavailable,
}

impl SelectionStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, SelectionStatus::Ready)
    }
}

/// Render seconds as `m:ss`.
///
/// Negative or non-finite input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let valid = if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        0.0
    };
    let minutes = (valid / 60.0).floor() as u64;
    let secs = (valid % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}
