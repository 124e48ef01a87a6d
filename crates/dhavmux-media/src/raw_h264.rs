//! Raw start-code delimited frame metadata.
//!
//! The stream carries no clock. Every video frame after the first
//! advances the timestamp by a fixed nominal period, and the frame rate
//! stamped into the output is a fixed guess.

use dhavmux_types::{FrameType, StreamParameters};
use tracing::{debug, warn};

use crate::geometry::{display_aspect, guess_ntsc_timings};
use crate::MediaResult;

/// Frame rate assumed for raw streams, which carry none.
pub const RAW_FIXED_FPS: u8 = 20;

/// Timestamp step applied per raw video frame.
pub const RAW_FRAME_PERIOD_NS: u64 = 60_000_000;

const UNIT_TYPE_OFFSET: usize = 3;
const UNIT_PAYLOAD_OFFSET: usize = 4;

const UNIT_VIDEO: u8 = 0xb6;
const UNIT_AUDIO: u8 = 0xf0;
const UNIT_CONFIG: u8 = 0xfb;
const INERT_UNITS: [u8; 6] = [0x00, 0x20, 0xb0, 0xb2, 0xb5, 0xfa];

/// Classify one complete raw frame and update `params`.
///
/// The whole frame, start code included, is the codec payload.
pub fn collect_raw_h264_frame_info(params: &mut StreamParameters, frame: &[u8]) -> MediaResult<()> {
    params.frame_type = FrameType::Undefined;

    if frame.is_empty() {
        return Ok(());
    }
    params.body = 0..frame.len();

    let Some(&unit_type) = frame.get(UNIT_TYPE_OFFSET) else {
        warn!(len = frame.len(), "Raw frame too short to carry a NAL type");
        return Ok(());
    };

    match unit_type {
        UNIT_VIDEO => {
            let coding = frame.get(UNIT_PAYLOAD_OFFSET).map_or(0, |b| (b >> 6) & 0x03);
            params.frame_type = if coding == 0 {
                FrameType::VideoKey
            } else {
                FrameType::Video
            };
        }
        UNIT_AUDIO => {
            params.frame_type = FrameType::Audio;
            return Ok(());
        }
        UNIT_CONFIG => {
            apply_config(params, frame);
            return Ok(());
        }
        inert if INERT_UNITS.contains(&inert) => return Ok(()),
        other => {
            warn!("Unknown H.264 NAL type received: {other:#04x}");
            return Ok(());
        }
    }

    if params.awaiting_first_video_frame {
        params.awaiting_first_video_frame = false;
        params.direct_timestamp_ns = 0;
    } else {
        params.direct_timestamp_ns += RAW_FRAME_PERIOD_NS;
    }
    params.timestamp_ns = params.direct_timestamp_ns;

    Ok(())
}

fn apply_config(params: &mut StreamParameters, frame: &[u8]) {
    let unit = |i: usize| frame.get(UNIT_PAYLOAD_OFFSET + i).copied().unwrap_or(0);
    let width = u32::from(unit(2)) * 8;
    let height = u32::from(unit(3)) * 8;
    if height == 0 {
        warn!(width, "Configuration record declares 0 height, ignored");
        return;
    }

    let (aspect_x, aspect_y) = display_aspect(width, height);
    params.width = width;
    params.height = height;
    params.fps = RAW_FIXED_FPS;
    params.aspect_x = aspect_x;
    params.aspect_y = aspect_y;
    params.ntsc_timings = guess_ntsc_timings(height, RAW_FIXED_FPS);
    params.has_video_params = true;
    debug!(width, height, "Video parameters known");
}
