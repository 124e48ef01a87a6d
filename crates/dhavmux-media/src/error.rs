//! Media error types.

use thiserror::Error;

/// Frame metadata errors.
#[derive(Debug, Error)]
pub enum MediaError {
    /// A key frame declared a frame rate of zero.
    #[error("Key frame header declares 0 fps")]
    ZeroFrameRate,
}
