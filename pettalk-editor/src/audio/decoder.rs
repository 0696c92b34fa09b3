//! Audio decoder using symphonia
//!
//! Decodes in-memory media (MP3, WAV, OGG/Vorbis, FLAC, AAC, MP4/MOV audio
//! tracks) to planar f32 PCM at the native sample rate.

use crate::audio::types::{DecodedAudio, MediaAsset};
use crate::error::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Stateless decoder entry points
pub struct SimpleDecoder;

/// An opened container positioned on its first audio track
pub(crate) struct OpenedTrack {
    pub format: Box<dyn FormatReader>,
    pub track_id: u32,
    pub sample_rate: u32,
    pub n_frames: Option<u64>,
}

impl SimpleDecoder {
    /// Probe the container and pick the first decodable audio track.
    pub(crate) fn open(asset: &MediaAsset) -> Result<OpenedTrack> {
        let source = Cursor::new(asset.bytes.clone());
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = asset.extension() {
            hint.with_extension(ext);
        }
        if !asset.mime_type.is_empty() {
            hint.mime_type(&asset.mime_type);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let format = probed.format;

        // Video containers list their picture tracks too; take the first
        // track that carries an audio sample rate.
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;
        let n_frames = track.codec_params.n_frames;

        debug!(
            "Opened {}: track={}, sample_rate={}, n_frames={:?}",
            asset.name, track_id, sample_rate, n_frames
        );

        Ok(OpenedTrack {
            format,
            track_id,
            sample_rate,
            n_frames,
        })
    }

    /// Decode an entire media file to planar PCM.
    ///
    /// # Errors
    /// - Unrecognized container or codec
    /// - No audio track
    /// - No samples decoded
    pub fn decode(asset: &MediaAsset) -> Result<DecodedAudio> {
        let OpenedTrack {
            mut format,
            track_id,
            sample_rate,
            ..
        } = Self::open(asset)?;

        let codec_params = format
            .tracks()
            .iter()
            .find(|t| t.id == track_id)
            .map(|t| t.codec_params.clone())
            .ok_or_else(|| Error::Decode("Audio track disappeared".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut planar: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of stream");
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut buf: AudioBuffer<f32> = decoded.make_equivalent();
                    decoded.convert(&mut buf);

                    let num_channels = buf.spec().channels.count();
                    if planar.is_empty() {
                        planar = vec![Vec::new(); num_channels];
                    }
                    if num_channels != planar.len() {
                        return Err(Error::Decode(format!(
                            "Channel count changed mid-stream ({} -> {})",
                            planar.len(),
                            num_channels
                        )));
                    }
                    for (ch_idx, dest) in planar.iter_mut().enumerate() {
                        dest.extend_from_slice(buf.chan(ch_idx));
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Decode failed: {}", e)));
                }
            }
        }

        if planar.first().map_or(true, |c| c.is_empty()) {
            return Err(Error::Decode(format!("No audio samples decoded from {}", asset.name)));
        }

        let audio = DecodedAudio::new(planar, sample_rate)?;
        debug!(
            "Decoded {}: {} frames x {} channels at {} Hz",
            asset.name,
            audio.frames(),
            audio.channel_count(),
            audio.sample_rate()
        );
        Ok(audio)
    }
}
