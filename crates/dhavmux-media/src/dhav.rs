//! DHAV frame metadata.

use dhavmux_types::{FrameType, StreamParameters, NANOS_PER_MILLI};
use tracing::{debug, trace, warn};

use crate::error::MediaError;
use crate::geometry::{display_aspect, guess_ntsc_timings};
use crate::subfields::SubfieldTable;
use crate::MediaResult;

const BASE_HEADER_LEN: usize = 24;
const TRAILER_LEN: usize = 8;

const TYPE_OFFSET: usize = 4;
const EPOCH_OFFSET: usize = 16;
const RELATIVE_TS_OFFSET: usize = 20;
const EXT_HEADER_LEN_OFFSET: usize = 22;

const TYPE_VIDEO: u8 = 0xfc;
const TYPE_VIDEO_KEY: u8 = 0xfd;
const TYPE_AUDIO: u8 = 0xf0;
const TYPE_TEXT_INFO: u8 = 0xf1;

const SF_GEOMETRY: u8 = 0x80;
const SF_FRAME_RATE: u8 = 0x81;

/// Classify one complete DHAV frame and update `params`.
///
/// Ordinary video frames are left unclassified until a key frame has made
/// the geometry known. Video frames also refresh the source clock fields
/// and the direct timestamp.
pub fn collect_dhav_frame_info(params: &mut StreamParameters, frame: &[u8]) -> MediaResult<()> {
    params.frame_type = FrameType::Undefined;

    if frame.len() < BASE_HEADER_LEN + TRAILER_LEN {
        if !frame.is_empty() {
            warn!(len = frame.len(), "DHAV frame shorter than its fixed header");
        }
        return Ok(());
    }

    let frame_type = frame[TYPE_OFFSET];
    let ext_len = usize::from(frame[EXT_HEADER_LEN_OFFSET]);
    let body_start = BASE_HEADER_LEN + ext_len;
    let body_end = frame.len() - TRAILER_LEN;
    let ext_end = body_start.min(body_end);
    let subfields = SubfieldTable::parse(&frame[BASE_HEADER_LEN..ext_end]);

    match frame_type {
        TYPE_VIDEO => {
            if !params.has_video_params {
                trace!("Skipping video frame until the first key frame");
                return Ok(());
            }
            params.frame_type = FrameType::Video;
        }
        TYPE_VIDEO_KEY => {
            let width = u32::from(subfields.get(SF_GEOMETRY, 2)) * 8;
            let height = u32::from(subfields.get(SF_GEOMETRY, 3)) * 8;
            let fps = subfields.get(SF_FRAME_RATE, 3);
            if fps == 0 {
                return Err(MediaError::ZeroFrameRate);
            }
            if height == 0 {
                warn!(width, "Key frame header declares 0 height, frame dropped");
                return Ok(());
            }

            let (aspect_x, aspect_y) = display_aspect(width, height);
            params.width = width;
            params.height = height;
            params.fps = fps;
            params.aspect_x = aspect_x;
            params.aspect_y = aspect_y;
            params.ntsc_timings = guess_ntsc_timings(height, fps);
            if !params.has_video_params {
                debug!(
                    width,
                    height,
                    fps,
                    ntsc = params.ntsc_timings,
                    "Video parameters known"
                );
            }
            params.has_video_params = true;
            params.frame_type = FrameType::VideoKey;
        }
        TYPE_AUDIO => {
            params.frame_type = FrameType::Audio;
            return Ok(());
        }
        TYPE_TEXT_INFO => return Ok(()),
        other => {
            warn!("Unknown DHAV frame type received: {other:#04x}");
            return Ok(());
        }
    }

    params.relative_ts_ms = u16::from_le_bytes([
        frame[RELATIVE_TS_OFFSET],
        frame[RELATIVE_TS_OFFSET + 1],
    ]);
    params.epoch = u32::from_le_bytes([
        frame[EPOCH_OFFSET],
        frame[EPOCH_OFFSET + 1],
        frame[EPOCH_OFFSET + 2],
        frame[EPOCH_OFFSET + 3],
    ]);

    if params.awaiting_first_video_frame {
        params.awaiting_first_video_frame = false;
        params.direct_timestamp_ns = 0;
    } else {
        let period_ms = params.relative_ts_ms.wrapping_sub(params.relative_ts_prev_ms);
        params.direct_timestamp_ns += u64::from(period_ms) * NANOS_PER_MILLI;
    }
    params.relative_ts_prev_ms = params.relative_ts_ms;
    params.timestamp_ns = params.direct_timestamp_ns;

    // An out-of-range header length leaves an empty, unusable body.
    params.body = body_start..body_end;

    Ok(())
}
