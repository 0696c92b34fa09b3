//! Media duration probe
//!
//! Reports how long a media file is. Every failure (unknown container, no
//! audio track, corrupt data, zero or non-finite length) resolves to
//! `MediaDuration::Unplayable` instead of an error.

use crate::audio::decoder::SimpleDecoder;
use crate::audio::types::{MediaAsset, MediaDuration};
use tracing::{debug, warn};

pub struct MediaDurationProbe;

impl MediaDurationProbe {
    /// Probe on the blocking pool so large files do not stall the caller.
    pub async fn probe(asset: MediaAsset) -> MediaDuration {
        match tokio::task::spawn_blocking(move || Self::probe_blocking(&asset)).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Duration probe task failed: {}", e);
                MediaDuration::Unplayable
            }
        }
    }

    /// Synchronous probe.
    ///
    /// The duration is the length of the audio that actually decodes. A
    /// container header can claim more frames than a truncated file holds,
    /// so the header count is only compared against it.
    pub fn probe_blocking(asset: &MediaAsset) -> MediaDuration {
        let opened = match SimpleDecoder::open(asset) {
            Ok(opened) => opened,
            Err(e) => {
                warn!("Cannot read duration of {}: {}", asset.name, e);
                return MediaDuration::Unplayable;
            }
        };
        let header_frames = opened.n_frames;
        drop(opened);

        let audio = match SimpleDecoder::decode(asset) {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Cannot decode {}: {}", asset.name, e);
                return MediaDuration::Unplayable;
            }
        };

        if let Some(n_frames) = header_frames {
            if n_frames != audio.frames() as u64 {
                warn!(
                    "{}: header declares {} frames but {} decode",
                    asset.name,
                    n_frames,
                    audio.frames()
                );
            }
        }
        debug!("{}: {:.3}s decoded", asset.name, audio.duration_secs());
        MediaDuration::from_seconds(audio.duration_secs())
    }
}
