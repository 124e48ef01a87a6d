//! Per-stream parameters shared by the pipeline stages.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::frame::{ContainerFormat, FrameType};

/// Long-lived state describing one source stream.
///
/// Updated once per frame by the metadata collector and, when enabled,
/// by the timestamp corrector. Nothing here is valid for video output
/// until `has_video_params` becomes true on the first key frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamParameters {
    /// Target container.
    pub target: ContainerFormat,

    /// Classification of the current frame.
    pub frame_type: FrameType,

    /// True once geometry and frame rate are known.
    pub has_video_params: bool,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Display aspect numerator (usually 4 or 16).
    pub aspect_x: u32,

    /// Display aspect denominator (usually 3 or 9).
    pub aspect_y: u32,

    /// Device epoch of the current frame, in seconds.
    pub epoch: u32,

    /// Presentation timestamp in nanoseconds, starting at zero.
    pub timestamp_ns: u64,

    /// Timestamp accumulated straight from the source clock, in nanoseconds.
    pub direct_timestamp_ns: u64,

    /// Relative source timestamp of the current frame, in milliseconds (wraps).
    pub relative_ts_ms: u16,

    /// Relative source timestamp of the previous video frame.
    pub relative_ts_prev_ms: u16,

    /// Guess of whether the source uses NTSC timings.
    pub ntsc_timings: bool,

    /// NTSC source runs at exact 60 Hz instead of 59.94 Hz.
    pub ntsc_exact_60hz: bool,

    /// Frame rate as advertised by the source.
    pub fps: u8,

    /// Codec payload of the current frame, relative to the frame span.
    pub body: Range<usize>,

    /// True until the first video frame has fed the direct timestamp.
    pub awaiting_first_video_frame: bool,
}

impl StreamParameters {
    /// Create parameters for a new session.
    pub fn new(target: ContainerFormat, ntsc_exact_60hz: bool) -> Self {
        Self {
            target,
            frame_type: FrameType::Undefined,
            has_video_params: false,
            width: 0,
            height: 0,
            aspect_x: 4,
            aspect_y: 3,
            epoch: 0,
            timestamp_ns: 0,
            direct_timestamp_ns: 0,
            relative_ts_ms: 0,
            relative_ts_prev_ms: 0,
            ntsc_timings: false,
            ntsc_exact_60hz,
            fps: 0,
            body: 0..0,
            awaiting_first_video_frame: true,
        }
    }

    /// Returns true when the NTSC 1000/1001 rate adjustment applies.
    pub fn uses_ntsc_rate_adjustment(&self) -> bool {
        self.ntsc_timings && !self.ntsc_exact_60hz
    }

    /// Returns the codec payload of `frame`, if the body range fits it.
    pub fn body_of<'a>(&self, frame: &'a [u8]) -> Option<&'a [u8]> {
        frame.get(self.body.clone())
    }
}

impl Default for StreamParameters {
    fn default() -> Self {
        Self::new(ContainerFormat::Matroska, false)
    }
}
