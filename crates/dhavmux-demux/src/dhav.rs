//! DHAV record demultiplexing.
//!
//! A DHAV record is laid out as:
//! - `DHAV` magic: 4 bytes
//! - type code: 1 byte (offset 4)
//! - reported total length `L`: u32 little-endian (offset 12)
//! - rest of the 24-byte base header, extended header and codec body
//! - trailer: `dhav` magic followed by `L` again as u32 little-endian
//!
//! The returned frame span covers all `L` bytes, both magics included.

use tracing::{debug, warn};

use crate::queue::ByteQueue;
use crate::{DemuxResult, FrameResult};

/// Leading record magic.
pub const DHAV_MAGIC: &[u8; 4] = b"DHAV";

/// Trailing record magic.
pub const DHAV_TRAILER_MAGIC: &[u8; 4] = b"dhav";

/// Length of the fixed base header.
pub const DHAV_HEADER_LEN: usize = 24;

/// Length of the trailer (`dhav` + mirrored length).
pub const DHAV_TRAILER_LEN: usize = 8;

/// Bytes required before a record start can be evaluated.
pub const DHAV_MIN_SCAN_LEN: usize = 16;

/// Offset of the reported total length.
const LENGTH_OFFSET: usize = 12;

/// Smallest record that holds a base header and a trailer.
const MIN_FRAME_LEN: usize = DHAV_HEADER_LEN + DHAV_TRAILER_LEN;

enum Validation {
    Complete(usize),
    Incomplete,
    Garbage(&'static str),
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn validate(data: &[u8], capacity: usize) -> Validation {
    if !data.starts_with(DHAV_MAGIC) {
        return Validation::Garbage("No DHAV header");
    }

    let reported = read_u32_le(data, LENGTH_OFFSET) as usize;
    if reported > capacity {
        // Cannot ever fit: assume corruption rather than an oversized frame.
        return Validation::Garbage("DHAV frame is either too large or corrupted");
    }
    if reported < MIN_FRAME_LEN {
        return Validation::Garbage("DHAV frame shorter than its own header");
    }
    if reported > data.len() {
        return Validation::Incomplete;
    }

    let trailer = reported - DHAV_TRAILER_LEN;
    if &data[trailer..trailer + 4] != DHAV_TRAILER_MAGIC {
        return Validation::Garbage("No dhav trailer");
    }
    if read_u32_le(data, trailer + 4) as usize != reported {
        return Validation::Garbage("Corrupt dhav size");
    }

    Validation::Complete(reported)
}

/// Advance past the current position up to the next `DHAV` magic.
///
/// Returns false when fewer than [`DHAV_MIN_SCAN_LEN`] bytes remain.
fn skip_garbage(queue: &mut ByteQueue) -> bool {
    let data = queue.as_slice();
    let n = data.len();

    let next = (1..=n.saturating_sub(DHAV_MIN_SCAN_LEN))
        .find(|&i| data[i..].starts_with(DHAV_MAGIC));

    match next {
        Some(skip) => {
            debug!(skipped = skip, "Resynchronised on DHAV magic");
            queue.consume(skip);
            true
        }
        None => {
            let skip = n.saturating_sub(DHAV_MIN_SCAN_LEN - 1).max(1);
            debug!(skipped = skip, remaining = n - skip, "No DHAV magic in buffered data");
            queue.consume(skip);
            false
        }
    }
}

/// Extract one DHAV record from `queue`, appending `input` first.
pub fn extract_dhav_frame<'q>(
    queue: &'q mut ByteQueue,
    input: Option<&[u8]>,
) -> DemuxResult<FrameResult<'q>> {
    if let Some(data) = input.filter(|d| !d.is_empty()) {
        queue.append(data)?;
    }

    let frame_len = loop {
        if queue.len() < DHAV_MIN_SCAN_LEN {
            return Ok(FrameResult::NeedMoreData);
        }

        match validate(queue.as_slice(), queue.capacity()) {
            Validation::Complete(len) => break len,
            Validation::Incomplete => return Ok(FrameResult::NeedMoreData),
            Validation::Garbage(reason) => {
                warn!("{}. Skipping garbage...", reason);
                if !skip_garbage(queue) {
                    return Ok(FrameResult::FrameSkipped);
                }
            }
        }
    };

    Ok(FrameResult::FrameReady(queue.take(frame_len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a DHAV record of `frame_type` around `body` with no extended header.
    fn build_frame(frame_type: u8, body: &[u8]) -> Vec<u8> {
        let len = (DHAV_HEADER_LEN + body.len() + DHAV_TRAILER_LEN) as u32;
        let mut frame = Vec::with_capacity(len as usize);
        frame.extend_from_slice(DHAV_MAGIC);
        frame.push(frame_type);
        frame.extend_from_slice(&[0; 7]);
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&[0; 8]);
        frame.extend_from_slice(body);
        frame.extend_from_slice(DHAV_TRAILER_MAGIC);
        frame.extend_from_slice(&len.to_le_bytes());
        frame
    }

    fn drain(queue: &mut ByteQueue) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        loop {
            match extract_dhav_frame(queue, None).unwrap() {
                FrameResult::FrameReady(frame) => frames.push(frame.to_vec()),
                FrameResult::FrameSkipped => continue,
                FrameResult::NeedMoreData => break,
            }
        }
        frames
    }

    #[test]
    fn test_single_frame() {
        let frame = build_frame(0xfd, &[1, 2, 3, 4]);
        let mut queue = ByteQueue::with_capacity(1024);

        let result = extract_dhav_frame(&mut queue, Some(&frame)).unwrap();
        assert_eq!(result, FrameResult::FrameReady(&frame[..]));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_partial_frame_needs_more_data() {
        let frame = build_frame(0xfc, &[7; 40]);
        let mut queue = ByteQueue::with_capacity(1024);

        let result = extract_dhav_frame(&mut queue, Some(&frame[..30])).unwrap();
        assert!(result.needs_more_data());
        assert_eq!(queue.len(), 30);

        let result = extract_dhav_frame(&mut queue, Some(&frame[30..])).unwrap();
        assert_eq!(result, FrameResult::FrameReady(&frame[..]));
    }

    #[test]
    fn test_drain_is_independent_of_chunking() {
        let frames: Vec<Vec<u8>> = (0..5u8)
            .map(|i| build_frame(0xfc, &vec![i; 10 + i as usize * 7]))
            .collect();
        let stream: Vec<u8> = frames.concat();

        for chunk_len in [1usize, 3, 17, 64, stream.len()] {
            let mut queue = ByteQueue::with_capacity(4096);
            let mut extracted = Vec::new();
            for chunk in stream.chunks(chunk_len) {
                queue.append(chunk).unwrap();
                extracted.extend(drain(&mut queue));
            }
            assert_eq!(extracted, frames, "chunk length {chunk_len}");
        }
    }

    #[test]
    fn test_buffered_frames_drain_then_need_more_data() {
        let frames: Vec<Vec<u8>> = (0..3u8).map(|i| build_frame(0xfc, &[i; 20])).collect();
        let mut queue = ByteQueue::with_capacity(4096);
        queue.append(&frames.concat()).unwrap();

        for frame in &frames {
            let result = extract_dhav_frame(&mut queue, None).unwrap();
            assert_eq!(result, FrameResult::FrameReady(&frame[..]));
        }
        assert!(extract_dhav_frame(&mut queue, None).unwrap().needs_more_data());
    }

    #[test]
    fn test_garbage_prefix_is_skipped() {
        let frames: Vec<Vec<u8>> = (0..3u8).map(|i| build_frame(0xfd, &[i; 24])).collect();

        for garbage_len in [1usize, 5, 15, 16, 100] {
            let mut stream = vec![0x5a; garbage_len];
            stream.extend(frames.concat());

            let mut queue = ByteQueue::with_capacity(4096);
            queue.append(&stream).unwrap();
            assert_eq!(drain(&mut queue), frames, "garbage length {garbage_len}");
        }
    }

    #[test]
    fn test_bad_trailer_resyncs_on_next_frame() {
        let mut broken = build_frame(0xfc, &[1; 16]);
        let trailer = broken.len() - DHAV_TRAILER_LEN;
        broken[trailer] = b'x';
        let good = build_frame(0xfd, &[2; 16]);

        let mut queue = ByteQueue::with_capacity(4096);
        queue.append(&broken).unwrap();
        queue.append(&good).unwrap();

        assert_eq!(drain(&mut queue), vec![good]);
    }

    #[test]
    fn test_mirrored_length_mismatch_is_garbage() {
        let mut broken = build_frame(0xfc, &[1; 16]);
        let last = broken.len() - 4;
        broken[last] ^= 0xff;
        let good = build_frame(0xfc, &[3; 8]);

        let mut queue = ByteQueue::with_capacity(4096);
        queue.append(&[broken, good.clone()].concat()).unwrap();

        assert_eq!(drain(&mut queue), vec![good]);
    }

    #[test]
    fn test_reported_length_beyond_capacity_is_garbage() {
        let mut huge = build_frame(0xfc, &[0; 8]);
        huge[LENGTH_OFFSET..LENGTH_OFFSET + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        let good = build_frame(0xfd, &[9; 8]);

        let mut queue = ByteQueue::with_capacity(256);
        queue.append(&[huge, good.clone()].concat()).unwrap();

        assert_eq!(drain(&mut queue), vec![good]);
    }

    #[test]
    fn test_garbage_only_reports_skipped() {
        let mut queue = ByteQueue::with_capacity(256);
        let result = extract_dhav_frame(&mut queue, Some(&[0x11; 40])).unwrap();

        assert_eq!(result, FrameResult::FrameSkipped);
        assert_eq!(queue.len(), DHAV_MIN_SCAN_LEN - 1);
    }

    #[test]
    fn test_overflow_is_fatal() {
        let mut queue = ByteQueue::with_capacity(32);
        let err = extract_dhav_frame(&mut queue, Some(&[0; 33])).unwrap_err();
        assert!(matches!(err, crate::DemuxError::Overflow { .. }));
    }
}
