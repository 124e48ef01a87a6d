//! Byte queue and frame demultiplexing.
//!
//! Raw device bytes are appended to a [`ByteQueue`] and scanned for one
//! complete, validated frame per call. Two source formats are supported:
//! the self-delimited DHAV record and a start-code delimited raw stream.

mod dhav;
mod error;
mod identify;
mod queue;
mod raw_h264;

pub use dhav::{
    extract_dhav_frame, DHAV_HEADER_LEN, DHAV_MAGIC, DHAV_MIN_SCAN_LEN, DHAV_TRAILER_LEN,
    DHAV_TRAILER_MAGIC,
};
pub use error::DemuxError;
pub use identify::identify_format;
pub use queue::ByteQueue;
pub use raw_h264::{extract_raw_h264_frame, find_start_code, RAW_MIN_SCAN_LEN, START_CODE};

use dhavmux_types::ContainerFormat;

/// Result type for demultiplexing operations.
pub type DemuxResult<T> = Result<T, DemuxError>;

/// Outcome of one demultiplexing attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameResult<'a> {
    /// No complete frame is buffered.
    NeedMoreData,

    /// A complete frame, borrowed from the queue until the next call.
    FrameReady(&'a [u8]),

    /// Garbage was skipped and too little data remains to evaluate another frame.
    FrameSkipped,
}

impl FrameResult<'_> {
    /// Returns true when the caller should feed more input before calling again.
    pub fn needs_more_data(&self) -> bool {
        matches!(self, Self::NeedMoreData)
    }
}

/// Extract one frame of `format` from `queue`, appending `input` first.
///
/// Call repeatedly with `input = None` to drain buffered frames until
/// [`FrameResult::NeedMoreData`] is returned.
pub fn extract_frame<'q>(
    format: ContainerFormat,
    queue: &'q mut ByteQueue,
    input: Option<&[u8]>,
) -> DemuxResult<FrameResult<'q>> {
    match format {
        ContainerFormat::RawH264 => extract_raw_h264_frame(queue, input),
        ContainerFormat::Dhav => extract_dhav_frame(queue, input),
        ContainerFormat::Matroska => Err(DemuxError::NotASource(format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_has_no_demuxer() {
        let mut queue = ByteQueue::with_capacity(64);
        let result = extract_frame(ContainerFormat::Matroska, &mut queue, Some(b"DHAV"));
        assert!(matches!(
            result,
            Err(DemuxError::NotASource(ContainerFormat::Matroska))
        ));
    }
}
