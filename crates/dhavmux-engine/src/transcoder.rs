//! Session pipeline: byte queue, demultiplexer, collector, corrector, writer.

use std::io::Write;
use std::sync::Arc;

use bytes::BytesMut;
use dhavmux_demux::{extract_frame, identify_format, ByteQueue, DemuxError, FrameResult};
use dhavmux_media::{
    collect_dhav_frame_info, collect_raw_h264_frame_info, Correction, TimestampCorrector,
    TimestampStatus,
};
use dhavmux_mkv::{MkvError, MkvWriter};
use dhavmux_types::{
    ContainerFormat, FrameType, StreamParameters, TimestampMode, TranscodeConfig, TranscodeStats,
};
use tracing::{debug, info, instrument, warn};

use crate::metrics::MetricsCollector;
use crate::EngineResult;

/// Per-format stages, created once the source format is known.
struct FramePipeline {
    format: ContainerFormat,
    params: StreamParameters,
    corrector: TimestampCorrector,
    correct_timestamps: bool,
    writer: MkvWriter,
    header_pending: bool,
    scratch: BytesMut,
}

impl FramePipeline {
    fn new(format: ContainerFormat, config: &TranscodeConfig) -> Self {
        let codec = config.codec_for(format);
        // The raw format has no source clock to correct.
        let correct_timestamps =
            config.timestamp_mode == TimestampMode::Correct && format == ContainerFormat::Dhav;

        info!(
            format = format.name(),
            codec = codec.codec_id(),
            correct_timestamps,
            "Transcoding pipeline ready"
        );

        Self {
            format,
            params: StreamParameters::new(ContainerFormat::Matroska, config.ntsc_exact_60hz),
            corrector: TimestampCorrector::new(config.correction.clone()),
            correct_timestamps,
            writer: MkvWriter::new(codec, config.max_output_len),
            header_pending: true,
            scratch: BytesMut::new(),
        }
    }

    /// Demultiplex and write every complete frame in `queue`.
    fn drain<W: Write>(
        &mut self,
        queue: &mut ByteQueue,
        input: Option<&[u8]>,
        out: &mut W,
        metrics: &MetricsCollector,
    ) -> EngineResult<()> {
        let mut input = input;
        loop {
            match extract_frame(self.format, queue, input.take())? {
                FrameResult::NeedMoreData => return Ok(()),
                FrameResult::FrameSkipped => metrics.record_resync(),
                FrameResult::FrameReady(frame) => self.process_frame(frame, out, metrics)?,
            }
        }
    }

    fn process_frame<W: Write>(
        &mut self,
        frame: &[u8],
        out: &mut W,
        metrics: &MetricsCollector,
    ) -> EngineResult<()> {
        metrics.record_frame_extracted();

        match self.format {
            ContainerFormat::RawH264 => collect_raw_h264_frame_info(&mut self.params, frame)?,
            ContainerFormat::Dhav => collect_dhav_frame_info(&mut self.params, frame)?,
            ContainerFormat::Matroska => return Err(DemuxError::NotASource(self.format).into()),
        }

        if self.params.frame_type == FrameType::Audio {
            metrics.record_audio_frame();
            return Ok(());
        }

        if self.correct_timestamps {
            let status = self.corrector.process(&self.params);
            if status.is_applied() {
                self.params.timestamp_ns = self.corrector.timestamp_ns();
            }
            if matches!(status, TimestampStatus::Corrected(c) if c != Correction::Steady) {
                metrics.record_timestamp_correction();
            }
        }

        match self
            .writer
            .emit(&self.params, frame, self.header_pending, &mut self.scratch)
        {
            Ok(written) => {
                self.header_pending = false;
                out.write_all(&self.scratch)?;
                self.scratch.clear();
                metrics.record_frame_written(written as u64);
                debug!(
                    len = written,
                    timestamp_ns = self.params.timestamp_ns,
                    frame_type = ?self.params.frame_type,
                    "Frame written"
                );
                Ok(())
            }
            Err(MkvError::NotApplicable | MkvError::ParametersUnknown) => {
                metrics.record_frame_dropped();
                Ok(())
            }
            Err(MkvError::InvalidBody) => {
                warn!(len = frame.len(), "Frame body out of range, frame dropped");
                metrics.record_frame_dropped();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// One DHAV / raw stream to Matroska transcoding session.
pub struct Transcoder {
    config: TranscodeConfig,
    queue: ByteQueue,
    pipeline: Option<FramePipeline>,
    metrics: Arc<MetricsCollector>,
}

impl Transcoder {
    /// Create a session. The source format is probed from the stream
    /// unless the configuration forces one.
    pub fn new(config: TranscodeConfig) -> EngineResult<Self> {
        config.validate()?;

        let metrics = Arc::new(MetricsCollector::new());
        metrics.start();

        let pipeline = config
            .source_format
            .map(|format| FramePipeline::new(format, &config));

        Ok(Self {
            queue: ByteQueue::with_capacity(config.queue_capacity),
            config,
            pipeline,
            metrics,
        })
    }

    /// Source format, once known.
    pub fn format(&self) -> Option<ContainerFormat> {
        self.pipeline.as_ref().map(|p| p.format)
    }

    /// Current stream parameters, once the source format is known.
    pub fn params(&self) -> Option<&StreamParameters> {
        self.pipeline.as_ref().map(|p| &p.params)
    }

    /// Shared handle to the session counters.
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Current session counters.
    pub fn stats(&self) -> TranscodeStats {
        self.metrics.snapshot()
    }

    /// Feed a chunk of source bytes and write any completed output to `out`.
    #[instrument(name = "transcoder_push", skip(self, chunk, out), fields(len = chunk.len()))]
    pub fn push<W: Write>(&mut self, chunk: &[u8], out: &mut W) -> EngineResult<()> {
        self.metrics.record_bytes_in(chunk.len() as u64);

        let mut rest = chunk;
        while !rest.is_empty() {
            let room = rest.len().min(self.queue.free());
            if room == 0 {
                return Err(DemuxError::Overflow {
                    needed: rest.len(),
                    available: 0,
                }
                .into());
            }
            let (piece, tail) = rest.split_at(room);
            rest = tail;

            match self.pipeline.as_mut() {
                Some(pipeline) => pipeline.drain(&mut self.queue, Some(piece), out, &self.metrics)?,
                None => {
                    self.queue.append(piece)?;
                    if self.probe(false) {
                        self.drain_buffered(out)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Signal end of input: write every frame still buffered.
    #[instrument(name = "transcoder_finish", skip(self, out))]
    pub fn finish<W: Write>(&mut self, out: &mut W) -> EngineResult<()> {
        if self.pipeline.is_none() {
            self.probe(true);
        }
        self.drain_buffered(out)?;
        out.flush()?;

        if !self.queue.is_empty() {
            debug!(len = self.queue.len(), "Discarding incomplete trailing data");
        }
        let stats = self.metrics.snapshot();
        info!(
            frames_written = stats.frames_written,
            bytes_out = stats.bytes_out,
            frames_dropped = stats.frames_dropped,
            "Transcoding finished"
        );
        self.metrics.stop();
        Ok(())
    }

    /// Try to identify the source format from the buffered bytes.
    ///
    /// Falls back to DHAV once the probe buffer is nearly full or input has
    /// ended. Returns true once a pipeline exists.
    fn probe(&mut self, input_ended: bool) -> bool {
        let format = match identify_format(self.queue.as_slice()) {
            Some(format) => format,
            None if input_ended || self.queue.free() < 2 * self.config.read_chunk_len => {
                warn!(
                    probed = self.queue.len(),
                    "Unable to identify media container. Assuming DHAV"
                );
                ContainerFormat::Dhav
            }
            None => return false,
        };

        self.pipeline = Some(FramePipeline::new(format, &self.config));
        true
    }

    fn drain_buffered<W: Write>(&mut self, out: &mut W) -> EngineResult<()> {
        match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.drain(&mut self.queue, None, out, &self.metrics),
            None => Ok(()),
        }
    }
}
