//! Mediaflow - Video Enhancement Pipeline
//!
//! Runs uploaded videos through ffmpeg and whisper: loudness normalization,
//! brightness correction, burned-in subtitles and noise filtering, then hands
//! the final file back over HTTP.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod paths;
pub mod server;
pub mod stage;
pub mod transcribe;
pub mod workflow;
