//! End-to-end transcoding of synthetic device streams.

use dhavmux_engine::Transcoder;
use dhavmux_types::{ContainerFormat, TimestampMode, TranscodeConfig};

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
const CLUSTER_ID: [u8; 4] = [0x1F, 0x43, 0xB6, 0x75];

/// Build a DHAV record.
fn dhav_frame(frame_type: u8, epoch: u32, relative_ts_ms: u16, ext: &[u8], body: &[u8]) -> Vec<u8> {
    let len = (24 + ext.len() + body.len() + 8) as u32;
    let mut frame = Vec::new();
    frame.extend_from_slice(b"DHAV");
    frame.push(frame_type);
    frame.extend_from_slice(&[0; 7]);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&epoch.to_le_bytes());
    frame.extend_from_slice(&relative_ts_ms.to_le_bytes());
    frame.push(ext.len() as u8);
    frame.push(0);
    frame.extend_from_slice(ext);
    frame.extend_from_slice(body);
    frame.extend_from_slice(b"dhav");
    frame.extend_from_slice(&len.to_le_bytes());
    frame
}

/// Key frame sub-fields: 80x64 at 25 fps.
fn key_ext() -> Vec<u8> {
    vec![0x80, 0x00, 0x0a, 0x08, 0x81, 0x00, 0x00, 25]
}

/// A written cluster: timecode in microseconds, keyframe flag, payload.
#[derive(Debug)]
struct Cluster {
    timecode_us: u64,
    key: bool,
    body: Vec<u8>,
}

fn be_u64(data: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[..8]);
    u64::from_be_bytes(bytes)
}

fn clusters(out: &[u8]) -> Vec<Cluster> {
    let mut pos = out
        .windows(4)
        .position(|w| w == CLUSTER_ID)
        .expect("no cluster written");
    let mut found = Vec::new();
    while pos < out.len() {
        assert_eq!(&out[pos..pos + 4], &CLUSTER_ID);
        let size = (be_u64(&out[pos + 4..]) & 0x00FF_FFFF_FFFF_FFFF) as usize;
        let end = pos + 12 + size;
        found.push(Cluster {
            timecode_us: be_u64(&out[pos + 21..]),
            key: out[pos + 41] & 0x80 != 0,
            body: out[pos + 42..end].to_vec(),
        });
        pos = end;
    }
    found
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn dhav_stream() -> Vec<u8> {
    let mut stream = Vec::new();
    // Inter frame ahead of the first key frame is dropped.
    stream.extend(dhav_frame(0xfc, 100, 0, &[], &[0xee; 3]));
    stream.extend(dhav_frame(0xfd, 100, 10, &key_ext(), &[0x01, 0x02, 0x03]));
    stream.extend(dhav_frame(0xf0, 100, 20, &[], &[0x55; 16]));
    stream.extend(dhav_frame(0xfc, 100, 55, &[], &[0x04, 0x05]));
    stream.extend_from_slice(&[0x5a; 9]);
    stream.extend(dhav_frame(0xfc, 100, 90, &[], &[0x06]));
    stream
}

fn transcode(config: TranscodeConfig, stream: &[u8], chunk_len: usize) -> (Transcoder, Vec<u8>) {
    let mut transcoder = Transcoder::new(config).expect("valid config");
    let mut out = Vec::new();
    for chunk in stream.chunks(chunk_len) {
        transcoder.push(chunk, &mut out).expect("push");
    }
    transcoder.finish(&mut out).expect("finish");
    (transcoder, out)
}

fn small_config() -> TranscodeConfig {
    TranscodeConfig {
        queue_capacity: 4096,
        read_chunk_len: 256,
        max_output_len: 8192,
        ..Default::default()
    }
}

#[test]
fn test_dhav_stream_to_matroska() {
    let (transcoder, out) = transcode(small_config(), &dhav_stream(), 7);

    assert_eq!(transcoder.format(), Some(ContainerFormat::Dhav));
    assert_eq!(&out[..4], &EBML_MAGIC);
    assert_eq!(count(&out, &EBML_MAGIC), 1);
    assert_eq!(count(&out, b"V_MPEG4/ISO/AVC"), 1);

    let clusters = clusters(&out);
    assert_eq!(clusters.len(), 3);
    assert!(clusters[0].key);
    assert!(!clusters[1].key);
    assert_eq!(clusters[0].body, vec![0x01, 0x02, 0x03]);
    assert_eq!(clusters[2].body, vec![0x06]);
    let timecodes: Vec<_> = clusters.iter().map(|c| c.timecode_us).collect();
    assert_eq!(timecodes, vec![0, 40_000, 80_000]);

    let params = transcoder.params().expect("pipeline");
    assert_eq!((params.width, params.height), (80, 64));
    assert_eq!((params.aspect_x, params.aspect_y), (4, 3));
    assert!(!params.ntsc_timings);

    let stats = transcoder.stats();
    assert_eq!(stats.frames_extracted, 5);
    assert_eq!(stats.frames_written, 3);
    assert_eq!(stats.frames_dropped, 1);
    assert_eq!(stats.audio_frames, 1);
    assert_eq!(stats.bytes_out, out.len() as u64);
}

#[test]
fn test_chunking_does_not_change_output() {
    let stream = dhav_stream();
    let (_, whole) = transcode(small_config(), &stream, 256);
    let (_, bytewise) = transcode(small_config(), &stream, 1);
    assert_eq!(whole, bytewise);
}

#[test]
fn test_direct_timestamps_without_correction() {
    let config = TranscodeConfig {
        timestamp_mode: TimestampMode::None,
        ..small_config()
    };
    let (_, out) = transcode(config, &dhav_stream(), 64);

    let timecodes: Vec<_> = clusters(&out).iter().map(|c| c.timecode_us).collect();
    assert_eq!(timecodes, vec![0, 45_000, 80_000]);
}

#[test]
fn test_raw_stream_to_matroska() {
    let mut stream = vec![0x00, 0x00, 0x01, 0xb2];
    stream.extend_from_slice(b"Dahua_ZH");
    stream.extend_from_slice(&[0x00, 0x00, 0x01, 0xfb, 0x00, 0x00, 88, 72]);
    let key = [0x00, 0x00, 0x01, 0xb6, 0x00, 0xaa, 0xbb];
    let inter = [0x00, 0x00, 0x01, 0xb6, 0x40, 0xcc];
    stream.extend_from_slice(&key);
    stream.extend_from_slice(&inter);
    stream.extend_from_slice(&inter);
    stream.extend_from_slice(&[0x00, 0x00, 0x01, 0xb0, 0x00, 0x00, 0x00, 0x00]);

    let (transcoder, out) = transcode(small_config(), &stream, 5);

    assert_eq!(transcoder.format(), Some(ContainerFormat::RawH264));
    assert_eq!(count(&out, b"V_MPEG4/ISO/ASP"), 1);

    let clusters = clusters(&out);
    assert_eq!(clusters.len(), 3);
    assert!(clusters[0].key);
    assert!(!clusters[2].key);
    assert_eq!(clusters[0].body, key.to_vec());
    assert_eq!(clusters[1].body, inter.to_vec());
    let timecodes: Vec<_> = clusters.iter().map(|c| c.timecode_us).collect();
    assert_eq!(timecodes, vec![0, 60_000, 120_000]);

    let params = transcoder.params().expect("pipeline");
    assert_eq!((params.width, params.height), (704, 576));
}

#[test]
fn test_zero_frame_rate_aborts() {
    let stream = dhav_frame(0xfd, 0, 0, &[0x80, 0x00, 0x0a, 0x08], &[]);
    let mut transcoder = Transcoder::new(small_config()).unwrap();
    let mut out = Vec::new();

    assert!(transcoder.push(&stream, &mut out).is_err());
}
