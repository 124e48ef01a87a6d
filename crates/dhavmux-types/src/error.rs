//! Error types for configuration validation.

use thiserror::Error;

/// Errors raised when a [`TranscodeConfig`](crate::TranscodeConfig) is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The byte queue cannot hold anything.
    #[error("Queue capacity must be greater than zero")]
    ZeroQueueCapacity,

    /// Read granularity is zero.
    #[error("Read chunk length must be greater than zero")]
    ZeroReadChunk,

    /// A read chunk does not leave room for probing and reassembly.
    #[error("Read chunk of {chunk} bytes exceeds half the queue capacity ({capacity} bytes)")]
    ReadChunkTooLarge { chunk: usize, capacity: usize },

    /// The output span limit cannot hold the largest frame the queue accepts.
    #[error("Output limit of {max_output} bytes must exceed the queue capacity ({capacity} bytes)")]
    OutputTooSmall { max_output: usize, capacity: usize },

    /// The forced source format is an output-only container.
    #[error("{0} cannot be read as a source format")]
    NotASource(&'static str),

    /// One of the timestamp correction thresholds is not positive.
    #[error("Invalid timestamp correction threshold: {0}")]
    InvalidThreshold(&'static str),
}
