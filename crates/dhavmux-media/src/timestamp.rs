//! Presentation clock reconstruction for DHAV video.
//!
//! The source stamps each frame with a 16-bit millisecond counter that is
//! both coarse and unreliable. The corrector advances its own clock by the
//! reference period of the declared frame rate and only follows the source
//! when the two disagree by more than jitter can explain: device clock
//! steps, dropped frames, and slow accumulated drift.

use dhavmux_types::{CorrectionConfig, StreamParameters, NANOS_PER_MILLI, NANOS_PER_SEC};
use tracing::{debug, info, instrument, warn};

/// Outcome of processing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStatus {
    /// Not a video frame; nothing changed.
    NotVideo,

    /// No key frame has made the frame rate known yet.
    ParametersUnknown,

    /// First applicable frame. The clock starts at zero.
    Seeded,

    /// The clock advanced.
    Corrected(Correction),
}

impl TimestampStatus {
    /// Returns true when the corrected clock is valid for the current frame.
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Seeded | Self::Corrected(_))
    }
}

/// Which branch advanced the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// One reference period, no discontinuity.
    Steady,

    /// The device epoch went backwards by `secs`.
    EpochBackwards { secs: u64 },

    /// The device epoch leapt forward by `secs`, taken as the new "now".
    EpochResync { secs: u64 },

    /// The device epoch leapt forward, absorbed as `frames` extra periods.
    EpochJump { frames: i64 },

    /// The source clock diverged by `frames` periods in one step.
    Drift { frames: i64 },

    /// Accumulated slow drift of `frames` periods was corrected.
    SlowDrift { frames: i64, reset: bool },
}

impl Correction {
    /// Returns true when this correction discarded the drift statistics.
    pub fn resets_drift_stats(self) -> bool {
        match self {
            Self::Steady => false,
            Self::SlowDrift { reset, .. } => reset,
            _ => true,
        }
    }
}

/// Slow-drift accumulators since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriftStats {
    /// Sum of source periods, in nanoseconds.
    pub raw_ns: i64,
    /// Sum of reference periods, in nanoseconds.
    pub reference_ns: i64,
    /// Sum of applied periods, in nanoseconds.
    pub effective_ns: i64,
    /// Number of samples.
    pub frames: i64,
}

impl DriftStats {
    fn fps(total_ns: i64, frames: i64) -> f64 {
        if total_ns == 0 {
            0.0
        } else {
            frames as f64 * NANOS_PER_SEC as f64 / total_ns as f64
        }
    }
}

/// Corrected presentation clock for one stream.
pub struct TimestampCorrector {
    config: CorrectionConfig,
    seeded: bool,
    raw_ns: i64,
    corrected_ns: i64,
    epoch: u32,
    relative_ts_ms: u16,
    stats: DriftStats,
}

impl TimestampCorrector {
    /// Create an unseeded corrector.
    pub fn new(config: CorrectionConfig) -> Self {
        Self {
            config,
            seeded: false,
            raw_ns: 0,
            corrected_ns: 0,
            epoch: 0,
            relative_ts_ms: 0,
            stats: DriftStats::default(),
        }
    }

    /// Corrected timestamp of the last processed frame, in nanoseconds.
    pub fn timestamp_ns(&self) -> u64 {
        self.corrected_ns.max(0) as u64
    }

    /// Current slow-drift accumulators.
    pub fn drift_stats(&self) -> DriftStats {
        self.stats
    }

    /// Advance the clock for the frame described by `params`.
    #[instrument(name = "timestamp_correct", skip_all, level = "trace")]
    pub fn process(&mut self, params: &StreamParameters) -> TimestampStatus {
        if !params.frame_type.is_video() {
            return TimestampStatus::NotVideo;
        }
        if !params.has_video_params || params.fps == 0 {
            return TimestampStatus::ParametersUnknown;
        }

        if !self.seeded {
            self.seeded = true;
            self.raw_ns = 0;
            self.corrected_ns = 0;
            self.stats = DriftStats::default();
            self.epoch = params.epoch;
            self.relative_ts_ms = params.relative_ts_ms;
            return TimestampStatus::Seeded;
        }

        let epoch_prev = self.epoch;
        let epoch_cur = params.epoch;
        let ts_prev = self.relative_ts_ms;
        self.epoch = epoch_cur;
        self.relative_ts_ms = params.relative_ts_ms;

        let second_ns = if params.uses_ntsc_rate_adjustment() {
            1_001_000_000
        } else {
            NANOS_PER_SEC as i64
        };
        let reference = second_ns / i64::from(params.fps);
        let mut raw_period =
            i64::from(params.relative_ts_ms.wrapping_sub(ts_prev)) * NANOS_PER_MILLI as i64;

        let (period, correction) = if epoch_cur < epoch_prev {
            let secs = u64::from(epoch_prev - epoch_cur);
            warn!(secs, "Device time went backwards. Assuming that time as current from now on");
            self.raw_ns = self.corrected_ns;
            raw_period = reference;
            (reference, Correction::EpochBackwards { secs })
        } else if u64::from(epoch_cur - epoch_prev) > self.config.max_epoch_forward_jump_secs {
            let secs = u64::from(epoch_cur - epoch_prev);
            if secs > self.config.max_epoch_pedantry_secs {
                warn!(secs, "Device time advanced too far. Assuming that time as current from now on");
                self.raw_ns = self.corrected_ns;
                raw_period = reference;
                (reference, Correction::EpochResync { secs })
            } else {
                warn!(secs, "Device time jumped. Corrected");
                let frames = (secs as i64).saturating_mul(NANOS_PER_SEC as i64) / reference;
                let period = (frames + 1).saturating_mul(reference);
                self.raw_ns = self.corrected_ns;
                raw_period = period;
                (period, Correction::EpochJump { frames })
            }
        } else {
            let drift = (self.raw_ns + raw_period) - (self.corrected_ns + reference);
            if drift.abs() > self.config.jitter_damping_frames * reference {
                warn!(drift_ms = drift / NANOS_PER_MILLI as i64, "Timestamp drift detected. Corrected");
                let frames = drift / reference;
                (reference + frames * reference, Correction::Drift { frames })
            } else {
                self.steady_step(raw_period, reference)
            }
        };

        if correction.resets_drift_stats() {
            self.stats = DriftStats::default();
        }

        self.raw_ns += raw_period;
        if period < 0 {
            // The clock never runs backwards; the source clock takes up the rest.
            self.raw_ns = self.corrected_ns;
        } else {
            self.corrected_ns += period;
        }

        debug!(
            timestamp_ns = self.corrected_ns,
            period_ns = period,
            ?correction,
            "Timestamp corrected"
        );
        TimestampStatus::Corrected(correction)
    }

    fn steady_step(&mut self, raw_period: i64, reference: i64) -> (i64, Correction) {
        let stats = &mut self.stats;
        stats.raw_ns += raw_period;
        stats.reference_ns += reference;
        stats.effective_ns += reference;
        stats.frames += 1;

        let diff = stats.raw_ns - stats.effective_ns;
        if stats.frames < self.config.slow_drift_min_samples || diff.abs() <= 2 * reference {
            return (reference, Correction::Steady);
        }

        let frames = diff / reference;
        let reset = frames.abs() > 2;
        warn!(
            drift_ms = diff / NANOS_PER_MILLI as i64,
            "Timestamp slow drift detected. {}",
            if reset {
                "Corrected (drift >1 frame)"
            } else {
                "Corrected as 1 frame drift"
            }
        );
        info!(
            frames = stats.frames,
            "FPS stats - Measured from device: {:.6} fps - Assumed: {:.6} fps - Post-correction: {:.6} fps",
            DriftStats::fps(stats.raw_ns, stats.frames),
            DriftStats::fps(stats.reference_ns, stats.frames),
            DriftStats::fps(stats.effective_ns, stats.frames),
        );

        if reset {
            (reference + frames * reference, Correction::SlowDrift { frames, reset })
        } else {
            // One period of real drift, the rest is jitter.
            let period = reference + frames.signum() * reference;
            stats.effective_ns += period - reference;
            (period, Correction::SlowDrift { frames, reset })
        }
    }
}
