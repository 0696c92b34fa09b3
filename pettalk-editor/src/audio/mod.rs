//! Audio processing
//!
//! Decoding (symphonia), duration probing, resampling (rubato), clip
//! extraction and WAV encoding/validation (hound).

pub mod decoder;
pub mod extract;
pub mod probe;
pub mod resampler;
pub mod types;
pub mod wav;

pub use decoder::SimpleDecoder;
pub use extract::AudioExtractionEngine;
pub use probe::MediaDurationProbe;
pub use resampler::Resampler;
pub use types::{DecodedAudio, MediaAsset, MediaDuration, MediaKind, OutputFormat};
pub use wav::{WavContainer, WavReport, WavValidator};
