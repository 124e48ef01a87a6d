//! dhav2mkv: DHAV / raw device stream to Matroska converter.

mod cli;
mod reader;

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use dhavmux_engine::Transcoder;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::reader::spawn_reader;

/// Interval between progress reports.
const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// Initialize logging. Output goes to stderr so stdout can carry the stream.
fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "dhav2mkv=info,dhavmux_engine=info,dhavmux_demux=info,dhavmux_media=info,dhavmux_mkv=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn report(transcoder: &Transcoder) {
    let metrics = transcoder.metrics();
    let rate = metrics.write_rate();
    metrics.mark_reported();
    match serde_json::to_string(&transcoder.stats()) {
        Ok(stats) => info!(fps = rate, %stats, "Progress"),
        Err(e) => info!(fps = rate, error = %e, "Progress"),
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let config = args.transcode_config()?;
    info!(?config, "dhav2mkv starting");

    let input: Box<dyn Read + Send> = match &args.in_file {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("opening input {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };
    let output: Box<dyn Write> = match &args.out_file {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating output {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut output = BufWriter::new(output);

    let (chunks, reader) =
        spawn_reader(input, config.read_chunk_len).context("starting input reader")?;
    let mut transcoder = Transcoder::new(config).context("creating transcoder")?;
    let mut last_report = Instant::now();

    loop {
        match chunks.recv_timeout(STATS_INTERVAL) {
            Ok(Ok(chunk)) => transcoder
                .push(&chunk, &mut output)
                .context("transcoding input")?,
            Ok(Err(e)) => return Err(e).context("reading input"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if last_report.elapsed() >= STATS_INTERVAL {
            report(&transcoder);
            last_report = Instant::now();
        }
    }

    transcoder
        .finish(&mut output)
        .context("flushing buffered frames")?;
    if reader.join().is_err() {
        anyhow::bail!("input reader thread panicked");
    }
    report(&transcoder);

    Ok(())
}
