//! pettalk-editor library interface
//!
//! Picks a 7-10 second segment of a dog video or audio recording, cuts it to
//! a WAV clip, and sends it to the remote emotion analysis service.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod selection;

pub use crate::error::{Error, Result, UserFailure};
