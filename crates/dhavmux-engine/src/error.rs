//! Engine error types.

use dhavmux_demux::DemuxError;
use dhavmux_media::MediaError;
use dhavmux_mkv::MkvError;
use dhavmux_types::ConfigError;
use thiserror::Error;

/// Errors that end a transcoding session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Demultiplexing failed.
    #[error("Demux error: {0}")]
    Demux(#[from] DemuxError),

    /// A frame header could not be reconciled.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Container synthesis failed.
    #[error("Matroska error: {0}")]
    Mkv(#[from] MkvError),

    /// Writing to the output sink failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}
