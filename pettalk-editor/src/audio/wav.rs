//! WAV container encoding and header validation
//!
//! Clips are written as canonical 44-byte-header PCM WAV files:
//!
//! | offset | field                                  |
//! |--------|----------------------------------------|
//! | 0      | `RIFF`, then file size − 8 (LE u32)    |
//! | 8      | `WAVE`                                 |
//! | 12     | `fmt `, chunk size 16                  |
//! | 20     | format code 1 (PCM), channel count     |
//! | 24     | sample rate, byte rate                 |
//! | 32     | block align, bits per sample (16)      |
//! | 36     | `data`, data size, samples (LE i16)    |

use crate::audio::types::DecodedAudio;
use crate::error::{Error, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Canonical header size for 16-bit PCM with no extra chunks
pub const HEADER_LEN: usize = 44;

/// Bits per encoded sample
pub const BITS_PER_SAMPLE: u16 = 16;

const PCM_FORMAT: u16 = 1;

/// An encoded WAV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    bytes: Vec<u8>,
    sample_rate: u32,
    channels: u16,
}

impl WavContainer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Convert a float sample to 16-bit PCM: `round(clamp(s, -1, 1) × 32767)`
pub fn to_pcm16(sample: f32) -> i16 {
    let clamped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    (clamped * i16::MAX as f32).round() as i16
}

/// Encode planar audio as a 16-bit PCM WAV file.
pub fn encode(audio: &DecodedAudio) -> Result<WavContainer> {
    let spec = WavSpec {
        channels: audio.channel_count(),
        sample_rate: audio.sample_rate(),
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let data_len = audio.frames() * audio.channel_count() as usize * 2;
    let mut cursor = Cursor::new(Vec::with_capacity(HEADER_LEN + data_len));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Validation(format!("Failed to start WAV: {}", e)))?;

        for sample in audio.interleaved() {
            writer
                .write_sample(to_pcm16(sample))
                .map_err(|e| Error::Validation(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| Error::Validation(format!("Failed to finalize WAV: {}", e)))?;
    }

    let bytes = cursor.into_inner();
    debug!(
        "Encoded WAV: {} bytes, {} Hz, {} channels",
        bytes.len(),
        audio.sample_rate(),
        audio.channel_count()
    );

    Ok(WavContainer {
        bytes,
        sample_rate: audio.sample_rate(),
        channels: audio.channel_count(),
    })
}

/// Header fields read back from a WAV buffer
#[derive(Debug, Clone, PartialEq)]
pub struct WavReport {
    pub is_valid: bool,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bits_per_sample: Option<u16>,
    /// Approximate, assuming a 44-byte header and nothing after `data`
    pub duration: Option<f64>,
    pub error: Option<String>,
}

impl WavReport {
    fn invalid(error: String) -> Self {
        Self {
            is_valid: false,
            sample_rate: None,
            channels: None,
            bits_per_sample: None,
            duration: None,
            error: Some(error),
        }
    }

    /// Turn an invalid report into a `Validation` error
    pub fn into_result(self) -> Result<WavReport> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(Error::Validation(
                self.error.unwrap_or_else(|| "invalid WAV".to_string()),
            ))
        }
    }
}

pub struct WavValidator;

impl WavValidator {
    /// Check a WAV header.
    ///
    /// Checks run in order: `RIFF` signature, `WAVE` marker, `fmt ` chunk
    /// marker, PCM format code. The first failing check is reported with what
    /// was found instead. This is a header sanity check for clips produced by
    /// [`encode`], not a general WAV parser.
    pub fn validate(bytes: &[u8]) -> WavReport {
        if bytes.len() < HEADER_LEN {
            return WavReport::invalid(format!(
                "Invalid WAV file: header needs {} bytes, found {}",
                HEADER_LEN,
                bytes.len()
            ));
        }

        let riff = &bytes[0..4];
        if riff != b"RIFF" {
            return WavReport::invalid(format!(
                "Invalid WAV file: missing RIFF signature, found {}",
                describe(riff)
            ));
        }

        let wave = &bytes[8..12];
        if wave != b"WAVE" {
            return WavReport::invalid(format!(
                "Invalid WAV file: not WAVE format, found {}",
                describe(wave)
            ));
        }

        let fmt = &bytes[12..16];
        if fmt != b"fmt " {
            return WavReport::invalid(format!(
                "Invalid WAV file: missing fmt chunk, found {}",
                describe(fmt)
            ));
        }

        let audio_format = read_u16(bytes, 20);
        if audio_format != PCM_FORMAT {
            return WavReport::invalid(format!(
                "Unsupported audio format {}: only PCM ({}) is supported",
                audio_format, PCM_FORMAT
            ));
        }

        let channels = read_u16(bytes, 22);
        let sample_rate = read_u32(bytes, 24);
        let bits_per_sample = read_u16(bytes, 34);

        let bytes_per_second =
            sample_rate as f64 * channels as f64 * (bits_per_sample as f64 / 8.0);
        let duration = if bytes_per_second > 0.0 {
            Some((bytes.len() - HEADER_LEN) as f64 / bytes_per_second)
        } else {
            None
        };

        WavReport {
            is_valid: true,
            sample_rate: Some(sample_rate),
            channels: Some(channels),
            bits_per_sample: Some(bits_per_sample),
            duration,
            error: None,
        }
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Quote four marker bytes, escaping anything non-printable
fn describe(marker: &[u8]) -> String {
    let text: String = marker
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                (b as char).to_string()
            } else {
                format!("\\x{:02x}", b)
            }
        })
        .collect();
    format!("\"{}\"", text)
}
