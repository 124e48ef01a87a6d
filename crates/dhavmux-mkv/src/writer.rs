//! Per-frame Matroska emission.

use bytes::{BufMut, BytesMut};
use dhavmux_types::{ContainerFormat, StreamParameters, VideoCodec};
use tracing::{debug, info};

use crate::ebml::{self, ids};
use crate::error::MkvError;
use crate::nal;
use crate::MkvResult;

/// Application name written into MuxingApp and WritingApp.
pub const MUXING_APP: &str = concat!("dhavmux ", env!("CARGO_PKG_VERSION"));

/// Width of the MuxingApp/WritingApp fields.
const APP_FIELD_LEN: usize = 16;

/// One timecode unit is a microsecond.
const TIMECODE_SCALE_NS: u64 = 1000;

/// Cluster bytes preceding the frame body.
pub const CLUSTER_OVERHEAD: usize = 4 + ebml::SIZE_LEN // Cluster
    + 1 + ebml::SIZE_LEN + 8 // Timecode
    + 1 + ebml::SIZE_LEN // SimpleBlock
    + BLOCK_HEADER_LEN;

/// Track number (as a 1-byte vint), relative timecode and flags.
const BLOCK_HEADER_LEN: usize = 4;

const TRACK_NUMBER: u64 = 1;
const TRACK_TYPE_VIDEO: u64 = 1;
const DISPLAY_UNIT_ASPECT: u64 = 3;
const SIMPLE_BLOCK_KEYFRAME: u8 = 0x80;

/// Builds the Matroska byte stream for one session.
#[derive(Debug, Clone)]
pub struct MkvWriter {
    codec: VideoCodec,
    max_output_len: usize,
}

impl MkvWriter {
    /// Create a writer stamping `codec` and emitting spans of at most `max_output_len` bytes.
    pub fn new(codec: VideoCodec, max_output_len: usize) -> Self {
        Self {
            codec,
            max_output_len,
        }
    }

    /// Codec written into the track entry.
    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    /// Append the output for one frame to `out`.
    ///
    /// With `first` set, the document preamble is written ahead of the
    /// frame's cluster. Returns the number of bytes appended. Nothing is
    /// appended on error.
    pub fn emit(
        &self,
        params: &StreamParameters,
        frame: &[u8],
        first: bool,
        out: &mut BytesMut,
    ) -> MkvResult<usize> {
        if params.target != ContainerFormat::Matroska || !params.frame_type.is_video() {
            return Err(MkvError::NotApplicable);
        }
        if !params.has_video_params {
            return Err(MkvError::ParametersUnknown);
        }
        let body = params.body_of(frame).ok_or(MkvError::InvalidBody)?;

        let preamble = if first {
            Some(self.preamble(params, body))
        } else {
            None
        };
        let preamble_len = preamble.as_ref().map_or(0, |p| p.len());

        let needed = preamble_len + CLUSTER_OVERHEAD + body.len();
        if needed > self.max_output_len {
            return Err(MkvError::BufferTooSmall {
                needed,
                max: self.max_output_len,
            });
        }

        out.reserve(needed);
        if let Some(preamble) = preamble {
            out.put_slice(&preamble);
        }
        let timecode_us = params.timestamp_ns / TIMECODE_SCALE_NS;
        put_cluster(out, timecode_us, params.frame_type.is_key(), body);

        Ok(needed)
    }

    /// EBML header, Segment start, Info and Tracks.
    fn preamble(&self, params: &StreamParameters, key_body: &[u8]) -> BytesMut {
        let codec_private = match self.codec {
            VideoCodec::MpegAvc if params.frame_type.is_key() => {
                nal::codec_private_from_key_frame(key_body)
            }
            _ => None,
        };
        let frame_rate = frame_rate(params);
        let app = app_field();

        info!(
            codec = self.codec.codec_id(),
            width = params.width,
            height = params.height,
            aspect_x = params.aspect_x,
            aspect_y = params.aspect_y,
            frame_rate,
            codec_private = codec_private.is_some(),
            "Writing Matroska header"
        );

        let mut buf = BytesMut::new();
        ebml::put_master(&mut buf, ids::EBML, |h| {
            ebml::put_uint(h, ids::EBML_VERSION, 1);
            ebml::put_uint(h, ids::EBML_READ_VERSION, 1);
            ebml::put_uint(h, ids::EBML_MAX_ID_LENGTH, 4);
            ebml::put_uint(h, ids::EBML_MAX_SIZE_LENGTH, 8);
            ebml::put_string(h, ids::DOC_TYPE, "matroska");
            ebml::put_uint(h, ids::DOC_TYPE_VERSION, 2);
            ebml::put_uint(h, ids::DOC_TYPE_READ_VERSION, 2);
        });

        ebml::put_id(&mut buf, ids::SEGMENT);
        ebml::put_unknown_size(&mut buf);

        ebml::put_master(&mut buf, ids::INFO, |info| {
            ebml::put_uint(info, ids::TIMECODE_SCALE, TIMECODE_SCALE_NS);
            ebml::put_binary(info, ids::MUXING_APP, &app);
            ebml::put_binary(info, ids::WRITING_APP, &app);
        });

        ebml::put_master(&mut buf, ids::TRACKS, |tracks| {
            ebml::put_master(tracks, ids::TRACK_ENTRY, |entry| {
                ebml::put_uint(entry, ids::TRACK_NUMBER, TRACK_NUMBER);
                ebml::put_uint(entry, ids::TRACK_UID, 1);
                ebml::put_uint(entry, ids::FLAG_LACING, 0);
                ebml::put_string(entry, ids::LANGUAGE, "und");
                ebml::put_uint(entry, ids::FLAG_DEFAULT, 1);
                ebml::put_string(entry, ids::CODEC_ID, self.codec.codec_id());
                if let Some(private) = &codec_private {
                    ebml::put_binary(entry, ids::CODEC_PRIVATE, private);
                }
                ebml::put_uint(entry, ids::TRACK_TYPE, TRACK_TYPE_VIDEO);
                ebml::put_master(entry, ids::VIDEO, |video| {
                    ebml::put_uint(video, ids::PIXEL_WIDTH, u64::from(params.width));
                    ebml::put_uint(video, ids::PIXEL_HEIGHT, u64::from(params.height));
                    ebml::put_uint(video, ids::DISPLAY_WIDTH, u64::from(params.aspect_x));
                    ebml::put_uint(video, ids::DISPLAY_HEIGHT, u64::from(params.aspect_y));
                    ebml::put_uint(video, ids::DISPLAY_UNIT, DISPLAY_UNIT_ASPECT);
                    ebml::put_f32(video, ids::FRAME_RATE, frame_rate);
                });
            });
        });

        debug!(len = buf.len(), "Matroska preamble built");
        buf
    }
}

/// Frame rate stamped into the track, with the NTSC 1000/1001 adjustment.
fn frame_rate(params: &StreamParameters) -> f32 {
    let fps = f32::from(params.fps);
    if params.uses_ntsc_rate_adjustment() {
        fps * 1000.0 / 1001.0
    } else {
        fps
    }
}

/// Application name, zero padded or truncated to the field width.
fn app_field() -> [u8; APP_FIELD_LEN] {
    let mut field = [0u8; APP_FIELD_LEN];
    let name = MUXING_APP.as_bytes();
    let len = name.len().min(APP_FIELD_LEN);
    field[..len].copy_from_slice(&name[..len]);
    field
}

/// One Cluster holding one SimpleBlock at relative time zero.
fn put_cluster(out: &mut BytesMut, timecode_us: u64, key: bool, body: &[u8]) {
    let block_len = BLOCK_HEADER_LEN + body.len();
    let timecode_len = ebml::element_len(ids::TIMECODE, 8);
    let cluster_len = timecode_len + ebml::element_len(ids::SIMPLE_BLOCK, block_len);

    ebml::put_header(out, ids::CLUSTER, cluster_len);
    ebml::put_uint_fixed(out, ids::TIMECODE, timecode_us);
    ebml::put_header(out, ids::SIMPLE_BLOCK, block_len);
    out.put_u8(0x80 | TRACK_NUMBER as u8);
    out.put_i16(0);
    out.put_u8(if key { SIMPLE_BLOCK_KEYFRAME } else { 0 });
    out.put_slice(body);
}
