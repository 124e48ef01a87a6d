//! Session metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dhavmux_types::TranscodeStats;
use parking_lot::RwLock;
use tracing::debug;

/// Collects per-session counters.
///
/// Counters are atomic so a reporting thread can take snapshots while the
/// session runs.
pub struct MetricsCollector {
    start_time: RwLock<Option<Instant>>,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
    frames_extracted: AtomicU64,
    frames_written: AtomicU64,
    frames_dropped: AtomicU64,
    audio_frames: AtomicU64,
    resyncs: AtomicU64,
    timestamp_corrections: AtomicU64,
    last_report_time: RwLock<Instant>,
    last_frames_written: AtomicU64,
}

impl MetricsCollector {
    /// Create a new, stopped collector.
    pub fn new() -> Self {
        Self {
            start_time: RwLock::new(None),
            bytes_in: AtomicU64::new(0),
            bytes_out: AtomicU64::new(0),
            frames_extracted: AtomicU64::new(0),
            frames_written: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            audio_frames: AtomicU64::new(0),
            resyncs: AtomicU64::new(0),
            timestamp_corrections: AtomicU64::new(0),
            last_report_time: RwLock::new(Instant::now()),
            last_frames_written: AtomicU64::new(0),
        }
    }

    /// Start the uptime clock.
    pub fn start(&self) {
        *self.start_time.write() = Some(Instant::now());
        *self.last_report_time.write() = Instant::now();
    }

    /// Stop the uptime clock.
    pub fn stop(&self) {
        *self.start_time.write() = None;
    }

    /// Record input bytes.
    pub fn record_bytes_in(&self, bytes: u64) {
        self.bytes_in.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a demultiplexed frame.
    pub fn record_frame_extracted(&self) {
        self.frames_extracted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a written frame and the bytes emitted for it.
    pub fn record_frame_written(&self, bytes: u64) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_out.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a frame that produced no output.
    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a discarded audio frame.
    pub fn record_audio_frame(&self) {
        self.audio_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a garbage resynchronisation.
    pub fn record_resync(&self) {
        self.resyncs.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a non-steady timestamp correction.
    pub fn record_timestamp_correction(&self) {
        self.timestamp_corrections.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current counters.
    pub fn snapshot(&self) -> TranscodeStats {
        let uptime_seconds = self
            .start_time
            .read()
            .map(|s| s.elapsed().as_secs())
            .unwrap_or(0);

        TranscodeStats {
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            frames_extracted: self.frames_extracted.load(Ordering::Relaxed),
            frames_written: self.frames_written.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            audio_frames: self.audio_frames.load(Ordering::Relaxed),
            resyncs: self.resyncs.load(Ordering::Relaxed),
            timestamp_corrections: self.timestamp_corrections.load(Ordering::Relaxed),
            uptime_seconds,
        }
    }

    /// Frames written per second since the last [`mark_reported`](Self::mark_reported).
    pub fn write_rate(&self) -> f32 {
        let elapsed = self.last_report_time.read().elapsed().as_secs_f32();
        let frames = self.frames_written.load(Ordering::Relaxed)
            - self.last_frames_written.load(Ordering::Relaxed);
        if elapsed > 0.0 {
            frames as f32 / elapsed
        } else {
            0.0
        }
    }

    /// Reset the window used by [`write_rate`](Self::write_rate).
    pub fn mark_reported(&self) {
        *self.last_report_time.write() = Instant::now();
        let written = self.frames_written.load(Ordering::Relaxed);
        self.last_frames_written.store(written, Ordering::Relaxed);
        debug!(frames_written = written, "Metrics window reset");
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = MetricsCollector::new();
        metrics.record_bytes_in(100);
        metrics.record_frame_extracted();
        metrics.record_frame_extracted();
        metrics.record_frame_written(60);
        metrics.record_frame_dropped();
        metrics.record_resync();

        let stats = metrics.snapshot();
        assert_eq!(stats.bytes_in, 100);
        assert_eq!(stats.bytes_out, 60);
        assert_eq!(stats.frames_extracted, 2);
        assert_eq!(stats.frames_written, 1);
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.resyncs, 1);
        assert_eq!(stats.uptime_seconds, 0);
    }

    #[test]
    fn test_write_rate_window() {
        let metrics = MetricsCollector::new();
        metrics.start();
        metrics.record_frame_written(10);
        metrics.mark_reported();
        assert_eq!(metrics.write_rate(), 0.0);
    }
}
