//! Transcoding session pipeline.
//!
//! A [`Transcoder`] owns one stream's byte queue, parameters, timestamp
//! corrector and Matroska writer. Raw device bytes are pushed in chunk by
//! chunk and every completed frame is written to the caller's sink as soon
//! as it has been demultiplexed.

mod error;
mod metrics;
mod transcoder;

pub use error::EngineError;
pub use metrics::MetricsCollector;
pub use transcoder::Transcoder;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
