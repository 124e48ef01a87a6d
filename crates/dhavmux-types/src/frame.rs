//! Frame and container classification types.

use serde::{Deserialize, Serialize};

/// Media container formats understood by the transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// Vendor self-delimited frame container (`DHAV` ... `dhav`).
    Dhav,

    /// Start-code delimited elementary stream (`00 00 01`).
    RawH264,

    /// Matroska output.
    Matroska,
}

impl ContainerFormat {
    /// Returns a display name for this format.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dhav => "DHAV",
            Self::RawH264 => "raw H.264",
            Self::Matroska => "Matroska",
        }
    }

    /// Returns true for formats the demultiplexer can read.
    pub fn is_source(self) -> bool {
        matches!(self, Self::Dhav | Self::RawH264)
    }

    /// Codec stamped into the output track when none is configured.
    pub fn default_codec(self) -> VideoCodec {
        match self {
            Self::RawH264 => VideoCodec::MpegAsp,
            Self::Dhav | Self::Matroska => VideoCodec::MpegAvc,
        }
    }
}

/// Classification of the frame currently held in [`StreamParameters`](crate::StreamParameters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameType {
    /// Not classified, or not a frame the pipeline acts upon.
    #[default]
    Undefined,

    /// Ordinary (P/B/S) video frame.
    Video,

    /// Key frame, decodable on its own.
    VideoKey,

    /// Audio frame. Recognised and dropped.
    Audio,
}

impl FrameType {
    /// Returns true for ordinary and key video frames.
    pub fn is_video(self) -> bool {
        matches!(self, Self::Video | Self::VideoKey)
    }

    /// Returns true for key frames.
    pub fn is_key(self) -> bool {
        matches!(self, Self::VideoKey)
    }
}

/// Video codec identifiers written into the Matroska track entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    /// H.264 / MPEG-4 Part 10.
    MpegAvc,

    /// MPEG-4 Part 2 Advanced Simple Profile.
    MpegAsp,
}

impl VideoCodec {
    /// Matroska `CodecID` string.
    pub fn codec_id(self) -> &'static str {
        match self {
            Self::MpegAvc => "V_MPEG4/ISO/AVC",
            Self::MpegAsp => "V_MPEG4/ISO/ASP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_codec_by_source() {
        assert_eq!(ContainerFormat::Dhav.default_codec(), VideoCodec::MpegAvc);
        assert_eq!(ContainerFormat::RawH264.default_codec(), VideoCodec::MpegAsp);
    }

    #[test]
    fn test_only_input_formats_are_sources() {
        assert!(ContainerFormat::Dhav.is_source());
        assert!(ContainerFormat::RawH264.is_source());
        assert!(!ContainerFormat::Matroska.is_source());
    }

    #[test]
    fn test_frame_type_predicates() {
        assert!(FrameType::Video.is_video());
        assert!(FrameType::VideoKey.is_video());
        assert!(FrameType::VideoKey.is_key());
        assert!(!FrameType::Video.is_key());
        assert!(!FrameType::Audio.is_video());
        assert!(!FrameType::Undefined.is_video());
    }
}
