//! Start-code delimited stream demultiplexing.
//!
//! Each frame starts with `00 00 01` followed by a one-byte unit type. A
//! frame is complete once the start code of the following frame has been
//! buffered; the returned span runs from the first start code up to, not
//! including, the second.

use tracing::warn;

use crate::error::DemuxError;
use crate::queue::ByteQueue;
use crate::{DemuxResult, FrameResult};

/// Three-byte unit start code.
pub const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Bytes required before a boundary search is attempted.
pub const RAW_MIN_SCAN_LEN: usize = 8;

/// Start code plus the mandatory unit type byte.
const UNIT_PREFIX_LEN: usize = 4;

/// Offset of the first `00 00 01` in `data`, if any.
pub fn find_start_code(data: &[u8]) -> Option<usize> {
    data.windows(START_CODE.len()).position(|w| w == START_CODE)
}

/// Extract one start-code delimited frame from `queue`, appending `input` first.
pub fn extract_raw_h264_frame<'q>(
    queue: &'q mut ByteQueue,
    input: Option<&[u8]>,
) -> DemuxResult<FrameResult<'q>> {
    if let Some(data) = input.filter(|d| !d.is_empty()) {
        queue.append(data)?;
    }

    if queue.len() < RAW_MIN_SCAN_LEN {
        return Ok(FrameResult::NeedMoreData);
    }

    match find_start_code(queue.as_slice()) {
        Some(0) => {}
        Some(garbage) => {
            warn!(skipped = garbage, "No NAL sequence. Skipping garbage...");
            queue.consume(garbage);
        }
        None => {
            // Keep a possible partial start code at the tail.
            let garbage = queue.len() - (START_CODE.len() - 1);
            warn!(skipped = garbage, "No NAL sequence. Skipping garbage...");
            queue.consume(garbage);
            return Ok(FrameResult::NeedMoreData);
        }
    }

    if queue.len() < RAW_MIN_SCAN_LEN {
        return Ok(FrameResult::NeedMoreData);
    }

    match find_start_code(&queue.as_slice()[UNIT_PREFIX_LEN..]) {
        Some(next) => Ok(FrameResult::FrameReady(queue.take(next + UNIT_PREFIX_LEN))),
        None if queue.free() == 0 => Err(DemuxError::FrameTooLarge {
            capacity: queue.capacity(),
        }),
        None => Ok(FrameResult::NeedMoreData),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_start_code() {
        assert_eq!(find_start_code(&[0, 0, 1, 0xb6]), Some(0));
        assert_eq!(find_start_code(&[9, 0, 0, 0, 1]), Some(2));
        assert_eq!(find_start_code(&[0, 0, 2, 0, 0]), None);
        assert_eq!(find_start_code(&[0, 0]), None);
    }

    #[test]
    fn test_split_at_second_start_code() {
        let first = [0x00, 0x00, 0x01, 0xb6, 0x00, 0x11, 0x22, 0x33, 0x44];
        let second = [0x00, 0x00, 0x01, 0xb6, 0x40, 0x55, 0x66, 0x77];
        let mut queue = ByteQueue::with_capacity(256);
        queue.append(&first).unwrap();
        queue.append(&second).unwrap();

        let result = extract_raw_h264_frame(&mut queue, None).unwrap();
        assert_eq!(result, FrameResult::FrameReady(&first[..]));
        assert_eq!(queue.as_slice(), &second[..]);

        // The second frame has no successor yet.
        assert!(extract_raw_h264_frame(&mut queue, None).unwrap().needs_more_data());
        assert_eq!(queue.len(), second.len());
    }

    #[test]
    fn test_leading_garbage_is_skipped() {
        let stream = [
            0xaa, 0xbb, 0xcc, 0x00, 0x00, 0x01, 0xb6, 0x00, 0x01, 0x02, 0x00, 0x00, 0x01, 0xf0,
            0x00, 0x00, 0x00,
        ];
        let mut queue = ByteQueue::with_capacity(256);

        let result = extract_raw_h264_frame(&mut queue, Some(&stream)).unwrap();
        assert_eq!(result, FrameResult::FrameReady(&stream[3..10]));
    }

    #[test]
    fn test_short_buffer_needs_more_data() {
        let mut queue = ByteQueue::with_capacity(256);
        let result = extract_raw_h264_frame(&mut queue, Some(&[0, 0, 1, 0xb6, 0, 0, 1])).unwrap();
        assert!(result.needs_more_data());
        assert_eq!(queue.len(), 7);
    }

    #[test]
    fn test_no_start_code_keeps_tail() {
        let mut queue = ByteQueue::with_capacity(256);
        let result = extract_raw_h264_frame(&mut queue, Some(&[7, 7, 7, 7, 7, 7, 0, 0])).unwrap();
        assert!(result.needs_more_data());
        assert_eq!(queue.as_slice(), &[0, 0]);

        // The retained bytes complete a start code split across chunks.
        let more = [0x01, 0xb6, 0x00, 0x09, 0x09, 0x00, 0x00, 0x01, 0xb6];
        let result = extract_raw_h264_frame(&mut queue, Some(&more)).unwrap();
        assert_eq!(result, FrameResult::FrameReady(&[0, 0, 1, 0xb6, 0, 9, 9][..]));
    }

    #[test]
    fn test_frame_filling_queue_is_fatal() {
        let mut queue = ByteQueue::with_capacity(16);
        let mut data = vec![0x00, 0x00, 0x01, 0xb6];
        data.extend_from_slice(&[0x42; 12]);

        let err = extract_raw_h264_frame(&mut queue, Some(&data)).unwrap_err();
        assert!(matches!(err, DemuxError::FrameTooLarge { capacity: 16 }));
    }
}
