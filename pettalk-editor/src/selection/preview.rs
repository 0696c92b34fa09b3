//! Selection previews
//!
//! Renderers consume a read-only `{duration, start, end}` window and produce a
//! drawable description. They never touch the selector or the decoded buffer
//! they were built from.

use crate::audio::types::{DecodedAudio, MediaKind};

/// The window a preview is drawn for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewWindow {
    pub duration: f64,
    pub start: f64,
    pub end: f64,
}

/// One thumbnail slot in a video strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailFrame {
    /// Seek position for the frame grab (seconds)
    pub time: f64,
    /// Whether the frame lies inside the selection
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedPreview {
    Waveform {
        /// Per pixel column `(min, max)` amplitude
        columns: Vec<(f32, f32)>,
        /// Highlighted column span
        selected: std::ops::Range<usize>,
    },
    Thumbnails {
        frames: Vec<ThumbnailFrame>,
    },
    /// Nothing to draw yet (no duration, no samples)
    Empty,
}

pub trait SelectionPreview {
    fn render(&self, window: &PreviewWindow) -> RenderedPreview;
}

/// Min/max amplitude strip of the first channel
pub struct WaveformPreview {
    samples: Vec<f32>,
    width: usize,
}

impl WaveformPreview {
    pub fn new(audio: &DecodedAudio, width: usize) -> Self {
        Self {
            samples: audio.channel(0).map(|c| c.to_vec()).unwrap_or_default(),
            width,
        }
    }
}

impl SelectionPreview for WaveformPreview {
    fn render(&self, window: &PreviewWindow) -> RenderedPreview {
        if self.width == 0 || self.samples.is_empty() || window.duration <= 0.0 {
            return RenderedPreview::Empty;
        }

        let step = (self.samples.len() / self.width).max(1);
        let columns = (0..self.width)
            .map(|i| {
                let lo = (i * step).min(self.samples.len());
                let hi = (lo + step).min(self.samples.len());
                let span = &self.samples[lo..hi];
                if span.is_empty() {
                    // Past the last sample: flat line
                    return (0.0, 0.0);
                }
                span.iter()
                    .fold((f32::MAX, f32::MIN), |(min, max), &s| (min.min(s), max.max(s)))
            })
            .collect();

        let column_at = |t: f64| {
            let pos = (t / window.duration * self.width as f64).floor();
            pos.clamp(0.0, self.width as f64) as usize
        };
        let start_col = column_at(window.start);
        let end_col = column_at(window.end).max(start_col);

        RenderedPreview::Waveform {
            columns,
            selected: start_col..end_col,
        }
    }
}

/// Evenly spaced frame grab positions for a video strip
pub struct ThumbnailStrip {
    frame_count: usize,
}

impl ThumbnailStrip {
    pub const DEFAULT_FRAMES: usize = 10;

    pub fn new(frame_count: usize) -> Self {
        Self { frame_count }
    }
}

impl Default for ThumbnailStrip {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FRAMES)
    }
}

impl SelectionPreview for ThumbnailStrip {
    fn render(&self, window: &PreviewWindow) -> RenderedPreview {
        if self.frame_count == 0 || window.duration <= 0.0 {
            return RenderedPreview::Empty;
        }

        let gap = window.duration / self.frame_count as f64;
        // Seeking exactly to the end yields no frame on most decoders
        let last = (window.duration - 0.01).max(0.0);
        let frames = (0..self.frame_count)
            .map(|i| {
                let time = (i as f64 * gap).min(last);
                ThumbnailFrame {
                    time,
                    selected: time >= window.start && time <= window.end,
                }
            })
            .collect();

        RenderedPreview::Thumbnails { frames }
    }
}

/// Pick the preview for a media kind.
///
/// Audio gets a waveform of the decoded buffer; video gets a thumbnail strip.
pub fn preview_for(
    kind: MediaKind,
    audio: Option<&DecodedAudio>,
    width: usize,
) -> Box<dyn SelectionPreview> {
    match (kind, audio) {
        (MediaKind::Audio, Some(audio)) => Box::new(WaveformPreview::new(audio, width)),
        (MediaKind::Audio, None) => Box::new(WaveformPreview {
            samples: Vec::new(),
            width,
        }),
        (MediaKind::Video, _) => Box::new(ThumbnailStrip::default()),
    }
}
