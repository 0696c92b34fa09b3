//! Deterministic WAV fixtures
//!
//! Each channel carries its own sine frequency so channel handling can be
//! told apart after extraction.

use hound::{SampleFormat, WavSpec, WavWriter};
use pettalk_editor::audio::MediaAsset;
use std::f32::consts::PI;
use std::io::Cursor;

/// Standard fixture sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

/// 16-bit PCM WAV bytes: `channels` sines at 440 Hz, 660 Hz, ...
pub fn sine_wav_bytes(channels: u16, sample_rate: u32, seconds: f64) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (sample_rate as f64 * seconds).round() as usize;
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            for ch in 0..channels {
                let freq = 440.0 + 220.0 * ch as f32;
                let sample = (2.0 * PI * freq * t).sin() * 0.5;
                writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// A WAV fixture wrapped as an uploaded asset
pub fn sine_asset(channels: u16, sample_rate: u32, seconds: f64) -> MediaAsset {
    MediaAsset::new(
        "bark.wav",
        "audio/wav",
        sine_wav_bytes(channels, sample_rate, seconds),
    )
}
