//! # PetTalk Common Library
//!
//! Shared code for the PetTalk workspace:
//! - Error type and result alias
//! - TOML configuration model and config file resolution
//! - Timestamp helpers used to label uploads

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
