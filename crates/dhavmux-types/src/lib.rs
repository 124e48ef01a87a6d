//! Shared stream parameters and configuration for the transcoder.
//!
//! This crate defines the data model passed between the demultiplexer,
//! the frame metadata collector, the timestamp corrector and the
//! Matroska writer.

mod config;
mod error;
mod frame;
mod params;
mod stats;

pub use config::{CorrectionConfig, TimestampMode, TranscodeConfig};
pub use error::ConfigError;
pub use frame::{ContainerFormat, FrameType, VideoCodec};
pub use params::StreamParameters;
pub use stats::TranscodeStats;

/// Nanoseconds per second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: u64 = 1_000_000;
