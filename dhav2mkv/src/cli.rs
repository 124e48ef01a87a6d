//! Command line flags and configuration assembly.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dhavmux_types::{ContainerFormat, TimestampMode, TranscodeConfig};

/// Convert a DHAV or raw H.264 device stream into Matroska.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Input file (default: stdin).
    #[arg(short = 'i', long = "in-file")]
    pub in_file: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(short = 'o', long = "out-file")]
    pub out_file: Option<PathBuf>,

    /// The NTSC source runs at exact 60 Hz rather than 59.94 Hz.
    #[arg(short = 'x', long = "sixty-hertz-ntsc")]
    pub sixty_hertz_ntsc: bool,

    /// Timestamp processing: 0 uses source timestamps, 1 corrects them.
    #[arg(short = 'r', long = "ts-proc", value_parser = clap::value_parser!(u8).range(0..=1))]
    pub ts_proc: Option<u8>,

    /// Force the source container instead of probing it.
    #[arg(long, value_enum)]
    pub source_format: Option<SourceFormat>,

    /// JSON session configuration. Flags take precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Source containers selectable from the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceFormat {
    Dhav,
    Raw,
}

impl From<SourceFormat> for ContainerFormat {
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Dhav => ContainerFormat::Dhav,
            SourceFormat::Raw => ContainerFormat::RawH264,
        }
    }
}

impl Args {
    /// Build the session configuration from the optional file and the flags.
    pub fn transcode_config(&self) -> anyhow::Result<TranscodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("opening config file {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => TranscodeConfig::default(),
        };

        if self.sixty_hertz_ntsc {
            config.ntsc_exact_60hz = true;
        }
        match self.ts_proc {
            Some(0) => config.timestamp_mode = TimestampMode::None,
            Some(_) => config.timestamp_mode = TimestampMode::Correct,
            None => {}
        }
        if let Some(format) = self.source_format {
            config.source_format = Some(format.into());
        }

        config.validate().context("invalid session configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from(["dhav2mkv", "-x", "-r", "0", "--source-format", "raw"]);
        let config = args.transcode_config().unwrap();
        assert!(config.ntsc_exact_60hz);
        assert_eq!(config.timestamp_mode, TimestampMode::None);
        assert_eq!(config.source_format, Some(ContainerFormat::RawH264));
    }

    #[test]
    fn test_ts_proc_range() {
        assert!(Args::try_parse_from(["dhav2mkv", "-r", "2"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["dhav2mkv"]);
        assert!(args.in_file.is_none());
        let config = args.transcode_config().unwrap();
        assert_eq!(config.timestamp_mode, TimestampMode::Correct);
        assert!(config.source_format.is_none());
    }
}
