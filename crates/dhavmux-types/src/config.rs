//! One-shot session configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::frame::{ContainerFormat, VideoCodec};

/// Default byte queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1_000_000;

/// Default read granularity.
pub const DEFAULT_READ_CHUNK_LEN: usize = 10_000;

/// Default maximum size of a single emitted output span.
pub const DEFAULT_MAX_OUTPUT_LEN: usize = 3_000_000;

/// How presentation timestamps are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampMode {
    /// Use the timestamp accumulated directly from the source clock.
    None,

    /// Reconstruct a smooth clock from the reference frame period.
    #[default]
    Correct,
}

/// Thresholds for the timestamp correction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Single-step drift tolerated before a hard correction, in frame periods.
    pub jitter_damping_frames: i64,

    /// Samples required before slow drift is evaluated.
    pub slow_drift_min_samples: i64,

    /// Largest forward epoch step absorbed by the relative clock, in seconds.
    pub max_epoch_forward_jump_secs: u64,

    /// Largest epoch step applied as whole frame periods, in seconds.
    pub max_epoch_pedantry_secs: u64,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            jitter_damping_frames: 4,
            slow_drift_min_samples: 1000,
            max_epoch_forward_jump_secs: 30,
            max_epoch_pedantry_secs: 5,
        }
    }
}

/// Configuration for one transcoding session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// NTSC source runs at exact 60 Hz instead of 59.94 Hz.
    pub ntsc_exact_60hz: bool,

    /// Timestamp production mode.
    pub timestamp_mode: TimestampMode,

    /// Codec id override (None picks one from the source format).
    pub codec: Option<VideoCodec>,

    /// Source format override (None probes the stream).
    pub source_format: Option<ContainerFormat>,

    /// Byte queue capacity in bytes.
    pub queue_capacity: usize,

    /// Input read granularity in bytes.
    pub read_chunk_len: usize,

    /// Maximum single output span in bytes.
    pub max_output_len: usize,

    /// Timestamp correction thresholds.
    pub correction: CorrectionConfig,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ntsc_exact_60hz: false,
            timestamp_mode: TimestampMode::Correct,
            codec: None,
            source_format: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            read_chunk_len: DEFAULT_READ_CHUNK_LEN,
            max_output_len: DEFAULT_MAX_OUTPUT_LEN,
            correction: CorrectionConfig::default(),
        }
    }
}

impl TranscodeConfig {
    /// Check the buffer sizing relations the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.read_chunk_len == 0 {
            return Err(ConfigError::ZeroReadChunk);
        }
        if self.read_chunk_len > self.queue_capacity / 2 {
            return Err(ConfigError::ReadChunkTooLarge {
                chunk: self.read_chunk_len,
                capacity: self.queue_capacity,
            });
        }
        if self.max_output_len <= self.queue_capacity {
            return Err(ConfigError::OutputTooSmall {
                max_output: self.max_output_len,
                capacity: self.queue_capacity,
            });
        }
        if let Some(format) = self.source_format.filter(|f| !f.is_source()) {
            return Err(ConfigError::NotASource(format.name()));
        }
        if self.correction.jitter_damping_frames <= 0 {
            return Err(ConfigError::InvalidThreshold("jitter_damping_frames"));
        }
        if self.correction.slow_drift_min_samples <= 0 {
            return Err(ConfigError::InvalidThreshold("slow_drift_min_samples"));
        }
        Ok(())
    }

    /// Codec for a stream of the given source format.
    pub fn codec_for(&self, source: ContainerFormat) -> VideoCodec {
        self.codec.unwrap_or_else(|| source.default_codec())
    }
}
