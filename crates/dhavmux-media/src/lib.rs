//! Frame metadata collection and presentation clock reconstruction.
//!
//! The collectors classify one complete frame and update the session's
//! [`StreamParameters`](dhavmux_types::StreamParameters). The
//! [`TimestampCorrector`] then replaces the source's coarse relative clock
//! with a smooth one derived from the declared frame rate.

mod dhav;
mod error;
mod geometry;
mod raw_h264;
mod subfields;
mod timestamp;

pub use dhav::collect_dhav_frame_info;
pub use error::MediaError;
pub use geometry::{display_aspect, guess_ntsc_timings};
pub use raw_h264::{collect_raw_h264_frame_info, RAW_FIXED_FPS, RAW_FRAME_PERIOD_NS};
pub use subfields::SubfieldTable;
pub use timestamp::{Correction, DriftStats, TimestampCorrector, TimestampStatus};

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
