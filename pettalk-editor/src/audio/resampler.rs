//! Audio resampling using rubato
//!
//! Converts clips to the rate the analysis service expects, so that the rate
//! declared in a WAV header always matches the spacing of its samples.

use crate::audio::types::DecodedAudio;
use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Audio resampler using rubato for sample rate conversion.
pub struct Resampler;

impl Resampler {
    /// Resample planar audio to `output_rate`.
    ///
    /// The output holds exactly `round(frames × output_rate / input_rate)`
    /// frames: the resampler delay is trimmed from the front and the tail is
    /// flushed.
    ///
    /// If input is already at `output_rate`, returns a copy without
    /// resampling.
    pub fn resample(input: &DecodedAudio, output_rate: u32) -> Result<DecodedAudio> {
        let input_rate = input.sample_rate();

        if output_rate == 0 {
            return Err(Error::Range("target sample rate must be positive".to_string()));
        }

        if input_rate == output_rate {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(input.clone());
        }

        let input_frames = input.frames();
        let ratio = output_rate as f64 / input_rate as f64;
        let expected_frames = (input_frames as f64 * ratio).round() as usize;

        debug!(
            "Resampling {} frames from {}Hz to {}Hz ({} channels)",
            input_frames,
            input_rate,
            output_rate,
            input.channel_count()
        );

        if input_frames == 0 {
            return DecodedAudio::new(
                vec![Vec::new(); input.channel_count() as usize],
                output_rate,
            );
        }

        let mut resampler =
            Self::create_resampler(ratio, input.channel_count(), input_frames)?;
        let delay = resampler.output_delay();

        let mut planar_output = resampler
            .process(input.channels(), None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        // Flush until the delayed tail is out
        while planar_output[0].len() < delay + expected_frames {
            let tail = resampler
                .process_partial::<Vec<f32>>(None, None)
                .map_err(|e| Error::Decode(format!("Resampling flush failed: {}", e)))?;
            if tail[0].is_empty() {
                break;
            }
            for (dest, chunk) in planar_output.iter_mut().zip(tail) {
                dest.extend(chunk);
            }
        }

        let channels: Vec<Vec<f32>> = planar_output
            .into_iter()
            .map(|ch| {
                let mut trimmed: Vec<f32> =
                    ch.into_iter().skip(delay).take(expected_frames).collect();
                trimmed.resize(expected_frames, 0.0);
                trimmed
            })
            .collect();

        debug!(
            "Resampled {} input frames to {} output frames",
            input_frames, expected_frames
        );

        DecodedAudio::new(channels, output_rate)
    }

    /// Create a rubato resampler.
    ///
    /// Uses FastFixedIn with a septic polynomial: good quality at low cost for
    /// clips of a few seconds processed in one chunk.
    fn create_resampler(
        ratio: f64,
        channels: u16,
        chunk_size: usize,
    ) -> Result<FastFixedIn<f32>> {
        FastFixedIn::<f32>::new(
            ratio,
            1.0, // no runtime ratio changes
            PolynomialDegree::Septic,
            chunk_size,
            channels as usize,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))
    }
}
