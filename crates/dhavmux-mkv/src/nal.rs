//! H.264 parameter set discovery for the track's CodecPrivate.
//!
//! Key frame bodies arrive in Annex B form (start code separated NAL
//! units). When such a body carries both an SPS and a PPS, they are copied
//! out as an Annex B blob so a player can configure its decoder before the
//! first block.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

/// Three-byte Annex B start code.
const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Four-byte Annex B start code used when re-emitting parameter sets.
const LONG_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// NAL unit classes the track configuration cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    /// Sequence parameter set (type 7).
    Sps,
    /// Picture parameter set (type 8).
    Pps,
    /// Slices, SEI, delimiters and anything else.
    Other,
}

impl NalUnitType {
    /// Classify a NAL unit by its header byte.
    pub fn from_header(header: u8) -> Self {
        match header & 0x1F {
            7 => Self::Sps,
            8 => Self::Pps,
            _ => Self::Other,
        }
    }
}

/// A NAL unit borrowed from an Annex B buffer, start code excluded.
#[derive(Debug, Clone, Copy)]
pub struct NalUnit<'a> {
    /// The NAL unit type.
    pub nal_type: NalUnitType,
    /// Header byte and payload.
    pub data: &'a [u8],
}

/// Offset and length of the next 3- or 4-byte start code at or after `from`.
fn next_start_code(data: &[u8], from: usize) -> Option<(usize, usize)> {
    let pos = from + data.get(from..)?.windows(3).position(|w| w == START_CODE)?;
    if pos > from && data[pos - 1] == 0 {
        Some((pos - 1, 4))
    } else {
        Some((pos, 3))
    }
}

/// Split an Annex B buffer into its NAL units.
///
/// Bytes before the first start code are ignored. Trailing zero bytes of a
/// unit that precede a 4-byte start code are not part of the unit.
pub fn parse_annex_b(data: &[u8]) -> Vec<NalUnit<'_>> {
    let mut units = Vec::new();
    let Some((mut start, mut code_len)) = next_start_code(data, 0) else {
        return units;
    };

    loop {
        let unit_start = start + code_len;
        let next = next_start_code(data, unit_start);
        let unit_end = next.map_or(data.len(), |(pos, _)| pos);

        if let Some(unit) = data.get(unit_start..unit_end).filter(|u| !u.is_empty()) {
            units.push(NalUnit {
                nal_type: NalUnitType::from_header(unit[0]),
                data: unit,
            });
        }

        match next {
            Some((pos, len)) => {
                start = pos;
                code_len = len;
            }
            None => break,
        }
    }

    units
}

/// First SPS and first PPS found in an Annex B buffer.
pub fn find_parameter_sets(annex_b: &[u8]) -> Option<(&[u8], &[u8])> {
    let units = parse_annex_b(annex_b);
    let sps = units.iter().find(|u| u.nal_type == NalUnitType::Sps)?;
    let pps = units.iter().find(|u| u.nal_type == NalUnitType::Pps)?;
    debug!(sps_len = sps.data.len(), pps_len = pps.data.len(), "Found H.264 parameter sets");
    Some((sps.data, pps.data))
}

/// CodecPrivate payload for an AVC track: `00 00 00 01 SPS 00 00 00 01 PPS`.
pub fn annex_b_codec_private(sps: &[u8], pps: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(2 * LONG_START_CODE.len() + sps.len() + pps.len());
    buf.put_slice(&LONG_START_CODE);
    buf.put_slice(sps);
    buf.put_slice(&LONG_START_CODE);
    buf.put_slice(pps);
    buf.freeze()
}

/// CodecPrivate payload derived from a key frame body, if it carries one.
pub fn codec_private_from_key_frame(body: &[u8]) -> Option<Bytes> {
    find_parameter_sets(body).map(|(sps, pps)| annex_b_codec_private(sps, pps))
}
