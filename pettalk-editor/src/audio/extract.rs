//! Clip extraction: decode, slice, shape, encode
//!
//! One code path serves both the local preview and the upload. The
//! [`OutputFormat`] decides whether channels are averaged to mono and whether
//! the clip is resampled.

use crate::audio::decoder::SimpleDecoder;
use crate::audio::resampler::Resampler;
use crate::audio::types::{DecodedAudio, MediaAsset, OutputFormat};
use crate::audio::wav::{self, WavContainer};
use crate::error::{Error, Result};
use crate::selection::SelectionRange;
use tracing::{debug, info};

pub struct AudioExtractionEngine;

impl AudioExtractionEngine {
    /// Extract `range` from `asset` as a WAV file, off the async runtime.
    pub async fn extract(
        asset: MediaAsset,
        range: SelectionRange,
        format: OutputFormat,
    ) -> Result<WavContainer> {
        tokio::task::spawn_blocking(move || Self::extract_blocking(&asset, range, format))
            .await
            .map_err(|e| Error::Decode(format!("Extraction task failed: {}", e)))?
    }

    pub fn extract_blocking(
        asset: &MediaAsset,
        range: SelectionRange,
        format: OutputFormat,
    ) -> Result<WavContainer> {
        let decoded = SimpleDecoder::decode(asset)?;
        let sliced = Self::slice(&decoded, range.start, range.end)?;
        let clip = Self::apply_format(&sliced, format)?;
        let container = wav::encode(&clip)?;

        info!(
            "Extracted {:.3}s..{:.3}s of {}: {} Hz, {} channel(s), {} bytes",
            range.start,
            range.end,
            asset.name,
            container.sample_rate(),
            container.channels(),
            container.len()
        );
        Ok(container)
    }

    /// Cut `[floor(start × rate), floor(end × rate))` out of every channel.
    ///
    /// The frame count may differ by one from `(end − start) × rate` because
    /// both bounds truncate.
    pub fn slice(audio: &DecodedAudio, start: f64, end: f64) -> Result<DecodedAudio> {
        if !start.is_finite() || !end.is_finite() {
            return Err(Error::Range(format!(
                "selection bounds must be finite (start={}, end={})",
                start, end
            )));
        }
        if start < 0.0 {
            return Err(Error::Range(format!("start {:.3}s is before 0", start)));
        }
        if start >= end {
            return Err(Error::Range(format!(
                "start {:.3}s is not before end {:.3}s",
                start, end
            )));
        }

        let rate = audio.sample_rate() as f64;
        let start_sample = (start * rate).floor() as usize;
        let end_sample = (end * rate).floor() as usize;

        if end_sample > audio.frames() {
            return Err(Error::Range(format!(
                "end sample {} is past the last frame ({})",
                end_sample,
                audio.frames()
            )));
        }
        if start_sample >= end_sample {
            return Err(Error::Range(format!(
                "selection {:.6}s..{:.6}s covers no samples at {} Hz",
                start,
                end,
                audio.sample_rate()
            )));
        }

        debug!(
            "Slicing frames {}..{} ({} frames)",
            start_sample,
            end_sample,
            end_sample - start_sample
        );

        let channels = audio
            .channels()
            .iter()
            .map(|ch| ch[start_sample..end_sample].to_vec())
            .collect();
        DecodedAudio::new(channels, audio.sample_rate())
    }

    /// Mix down and resample as `format` asks.
    pub fn apply_format(audio: &DecodedAudio, format: OutputFormat) -> Result<DecodedAudio> {
        let shaped = if format.preserve_channels {
            audio.clone()
        } else {
            audio.mixdown()
        };

        match format.target_sample_rate {
            Some(rate) if rate != shaped.sample_rate() => Resampler::resample(&shaped, rate),
            _ => Ok(shaped),
        }
    }
}
