//! Core audio data types

use crate::error::{Error, Result};

/// Coarse media category, used to choose a selection preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// `audio/*` is audio; everything else is treated as video
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.trim().to_ascii_lowercase().starts_with("audio/") {
            MediaKind::Audio
        } else {
            MediaKind::Video
        }
    }
}

/// An uploaded media file held in memory
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaAsset {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }

    /// File extension, used as a decoder hint
    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
    }
}

/// Result of probing a media file for its length.
///
/// `Loading` is the state before a probe finishes; `Unplayable` is a finished
/// probe that found no usable duration. Callers must keep the two apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaDuration {
    Loading,
    Playable(f64),
    Unplayable,
}

impl MediaDuration {
    /// Seconds, with `0.0` for loading and unplayable media
    pub fn seconds(&self) -> f64 {
        match self {
            MediaDuration::Playable(secs) => *secs,
            MediaDuration::Loading | MediaDuration::Unplayable => 0.0,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, MediaDuration::Loading)
    }

    /// Wrap a raw duration, mapping non-finite, negative and zero values to
    /// `Unplayable`.
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            MediaDuration::Playable(seconds)
        } else {
            MediaDuration::Unplayable
        }
    }
}

/// Planar PCM samples in `[-1.0, 1.0]` at a single sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl DecodedAudio {
    /// Build from per-channel sample arrays.
    ///
    /// Fails when there are no channels, the rate is zero, or the channels
    /// differ in length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::Decode("audio has no channels".to_string()));
        }
        if sample_rate == 0 {
            return Err(Error::Decode("audio has a zero sample rate".to_string()));
        }
        let frames = channels[0].len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(Error::Decode(format!(
                "channel {} has {} samples, channel 0 has {}",
                idx,
                ch.len(),
                frames
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, idx: usize) -> Option<&[f32]> {
        self.channels.get(idx).map(|c| c.as_slice())
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Interleave channels frame by frame: `[L, R, L, R, ...]`
    pub fn interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels.len();
        let mut out = Vec::with_capacity(self.frames() * num_channels);
        for frame_idx in 0..self.frames() {
            for ch in &self.channels {
                out.push(ch[frame_idx]);
            }
        }
        out
    }

    /// Average all channels into one
    pub fn mixdown(&self) -> DecodedAudio {
        if self.channels.len() == 1 {
            return self.clone();
        }

        let count = self.channels.len() as f32;
        let mono = (0..self.frames())
            .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / count)
            .collect();

        DecodedAudio {
            channels: vec![mono],
            sample_rate: self.sample_rate,
        }
    }
}

/// How an extracted clip is shaped before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    /// Keep the source channel layout instead of averaging to mono
    pub preserve_channels: bool,
    /// Resample to this rate; `None` keeps the source rate
    pub target_sample_rate: Option<u32>,
}

impl OutputFormat {
    /// Rate the analysis service expects
    pub const UPLOAD_SAMPLE_RATE: u32 = 16_000;

    /// Clip played back to the user: native layout and rate
    pub fn preview() -> Self {
        Self {
            preserve_channels: true,
            target_sample_rate: None,
        }
    }

    /// Clip sent for analysis: mono at the upload rate
    pub fn upload() -> Self {
        Self {
            preserve_channels: false,
            target_sample_rate: Some(Self::UPLOAD_SAMPLE_RATE),
        }
    }
}
