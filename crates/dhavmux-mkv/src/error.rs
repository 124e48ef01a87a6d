//! Matroska error types.

use thiserror::Error;

/// Container synthesis errors.
#[derive(Debug, Error)]
pub enum MkvError {
    /// The frame is not a video frame, or the stream targets another container.
    #[error("Frame is not applicable to Matroska output")]
    NotApplicable,

    /// No key frame has made the video parameters known.
    #[error("Video parameters are not known yet")]
    ParametersUnknown,

    /// The output would exceed the configured maximum span.
    #[error("Output of {needed} bytes exceeds the {max} byte limit")]
    BufferTooSmall { needed: usize, max: usize },

    /// The frame's body range does not lie inside the frame.
    #[error("Frame body lies outside the frame")]
    InvalidBody,
}
