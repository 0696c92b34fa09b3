//! Shared helpers for pettalk-editor integration tests
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

pub mod audio_generator;
pub mod fake_services;
pub mod mock_service;
