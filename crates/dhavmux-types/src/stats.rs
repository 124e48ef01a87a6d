//! Session counters.

use serde::{Deserialize, Serialize};

/// Counters for one transcoding session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeStats {
    /// Bytes pushed into the session.
    pub bytes_in: u64,

    /// Bytes handed to the output sink.
    pub bytes_out: u64,

    /// Complete frames extracted by the demultiplexer.
    pub frames_extracted: u64,

    /// Frames written as Matroska clusters.
    pub frames_written: u64,

    /// Non-audio frames not written: inert, unknown, or ahead of the first key frame.
    pub frames_dropped: u64,

    /// Audio frames recognised and discarded.
    pub audio_frames: u64,

    /// Garbage resynchronisations that ran out of buffered data.
    pub resyncs: u64,

    /// Frames on which the timestamp corrector applied a correction.
    pub timestamp_corrections: u64,

    /// Session uptime in seconds (filled in by snapshots).
    pub uptime_seconds: u64,
}
