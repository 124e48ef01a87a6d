//! Error types for the demux module.

use dhavmux_types::ContainerFormat;
use thiserror::Error;

/// Errors that abort demultiplexing of the current chunk.
#[derive(Debug, Error)]
pub enum DemuxError {
    /// Incoming data does not fit the queue even after compaction.
    #[error("Byte queue overflow: {needed} bytes needed, {available} available")]
    Overflow { needed: usize, available: usize },

    /// A pending frame fills the whole queue and can never complete.
    #[error("Frame larger than the queue capacity ({capacity} bytes)")]
    FrameTooLarge { capacity: usize },

    /// The format has no demultiplexer.
    #[error("{} is not a source format", .0.name())]
    NotASource(ContainerFormat),
}
