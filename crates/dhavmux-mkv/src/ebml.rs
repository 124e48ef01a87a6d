//! EBML element identifiers and writers.
//!
//! Every element size is written in the 8-byte form (`0x01` marker plus
//! seven value bytes). Sizes are therefore known up front and never need
//! re-encoding.

use bytes::{BufMut, BytesMut};

/// Length of every size field written.
pub const SIZE_LEN: usize = 8;

/// Largest size representable in the 8-byte form (all-ones is reserved).
pub const MAX_SIZE: u64 = (1 << 56) - 2;

/// Element identifiers, marker bits included.
pub mod ids {
    pub const EBML: u32 = 0x1A45_DFA3;
    pub const EBML_VERSION: u32 = 0x4286;
    pub const EBML_READ_VERSION: u32 = 0x42F7;
    pub const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
    pub const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
    pub const DOC_TYPE: u32 = 0x4282;
    pub const DOC_TYPE_VERSION: u32 = 0x4287;
    pub const DOC_TYPE_READ_VERSION: u32 = 0x4285;

    pub const SEGMENT: u32 = 0x1853_8067;

    pub const INFO: u32 = 0x1549_A966;
    pub const TIMECODE_SCALE: u32 = 0x2A_D7B1;
    pub const MUXING_APP: u32 = 0x4D80;
    pub const WRITING_APP: u32 = 0x5741;

    pub const TRACKS: u32 = 0x1654_AE6B;
    pub const TRACK_ENTRY: u32 = 0xAE;
    pub const TRACK_NUMBER: u32 = 0xD7;
    pub const TRACK_UID: u32 = 0x73C5;
    pub const TRACK_TYPE: u32 = 0x83;
    pub const FLAG_DEFAULT: u32 = 0x88;
    pub const FLAG_LACING: u32 = 0x9C;
    pub const LANGUAGE: u32 = 0x22_B59C;
    pub const CODEC_ID: u32 = 0x86;
    pub const CODEC_PRIVATE: u32 = 0x63A2;

    pub const VIDEO: u32 = 0xE0;
    pub const PIXEL_WIDTH: u32 = 0xB0;
    pub const PIXEL_HEIGHT: u32 = 0xBA;
    pub const DISPLAY_WIDTH: u32 = 0x54B0;
    pub const DISPLAY_HEIGHT: u32 = 0x54BA;
    pub const DISPLAY_UNIT: u32 = 0x54B2;
    pub const FRAME_RATE: u32 = 0x23_83E3;

    pub const CLUSTER: u32 = 0x1F43_B675;
    pub const TIMECODE: u32 = 0xE7;
    pub const SIMPLE_BLOCK: u32 = 0xA3;
}

/// Encoded length of an element id.
pub fn id_len(id: u32) -> usize {
    match id {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}

/// Total encoded length of an element with `payload_len` bytes of data.
pub fn element_len(id: u32, payload_len: usize) -> usize {
    id_len(id) + SIZE_LEN + payload_len
}

/// Write an element id.
pub fn put_id(buf: &mut BytesMut, id: u32) {
    let bytes = id.to_be_bytes();
    buf.put_slice(&bytes[4 - id_len(id)..]);
}

/// Write an 8-byte size field.
pub fn put_size(buf: &mut BytesMut, size: u64) {
    debug_assert!(size <= MAX_SIZE, "EBML size {size} out of range");
    buf.put_u64(size | (1 << 56));
}

/// Write the 8-byte "unknown size" marker.
pub fn put_unknown_size(buf: &mut BytesMut) {
    buf.put_u64(0x01FF_FFFF_FFFF_FFFF);
}

/// Write an element header.
pub fn put_header(buf: &mut BytesMut, id: u32, payload_len: usize) {
    put_id(buf, id);
    put_size(buf, payload_len as u64);
}

/// Write an unsigned integer element using the fewest bytes (at least one).
pub fn put_uint(buf: &mut BytesMut, id: u32, value: u64) {
    let width = (8 - value.leading_zeros() as usize / 8).max(1);
    put_header(buf, id, width);
    buf.put_uint(value, width);
}

/// Write an unsigned integer element with an 8-byte payload.
pub fn put_uint_fixed(buf: &mut BytesMut, id: u32, value: u64) {
    put_header(buf, id, 8);
    buf.put_u64(value);
}

/// Write a 32-bit float element.
pub fn put_f32(buf: &mut BytesMut, id: u32, value: f32) {
    put_header(buf, id, 4);
    buf.put_f32(value);
}

/// Write a binary element.
pub fn put_binary(buf: &mut BytesMut, id: u32, data: &[u8]) {
    put_header(buf, id, data.len());
    buf.put_slice(data);
}

/// Write a string element.
pub fn put_string(buf: &mut BytesMut, id: u32, value: &str) {
    put_binary(buf, id, value.as_bytes());
}

/// Write a master element whose children are produced by `children`.
pub fn put_master(buf: &mut BytesMut, id: u32, children: impl FnOnce(&mut BytesMut)) {
    let mut content = BytesMut::new();
    children(&mut content);
    put_header(buf, id, content.len());
    buf.put_slice(&content);
}
