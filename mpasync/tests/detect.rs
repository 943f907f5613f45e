use std::io::{Cursor, Seek, SeekFrom};

use anyhow::Result;
use mpasync::process::detect::{Acceptance, Detector, DetectorConfig, ScanState, Verdict};
use mpasync::process::{Streaming, is_mpeg_audio};
use mpasync::utils::errors::ProbeError;

/// MPEG-1 layer III, 128 kbps, 44.1 kHz, no padding: 417 byte frames.
const HEADER_128K: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];

fn frames(count: usize) -> Vec<u8> {
    let mut frame = vec![0u8; 417];
    frame[..4].copy_from_slice(&HEADER_128K);
    frame.repeat(count)
}

fn id3_tag(size: u32, fill: u8) -> Vec<u8> {
    let mut tag = b"ID3\x04\x00\x00".to_vec();
    tag.extend_from_slice(&[
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]);
    tag.resize(10 + size as usize, fill);
    tag
}

/// Runs a probe step by step so the scan state can be inspected afterwards.
fn run_steps(data: Vec<u8>) -> Result<(Acceptance, ScanState)> {
    let detector = Detector::default();
    let mut src = Cursor::new(data);
    let mut state = ScanState::new(detector.config(), false);

    loop {
        if let Some(acceptance) = detector.step(&mut src, &mut state)? {
            return Ok((acceptance, state));
        }
    }
}

fn xorshift_bytes(len: usize, mut seed: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed >> 24) as u8
        })
        .collect()
}

#[test]
fn consecutive_frames_accepted() {
    let detector = Detector::default();

    for count in 3..6 {
        assert!(detector.detect(&mut Cursor::new(frames(count))));
    }
    assert!(!detector.detect(&mut Cursor::new(frames(2))));
}

#[test]
fn streaming_threshold() {
    let detector = Detector::default();

    let verdict = detector.probe(&mut Streaming::new(Cursor::new(frames(2))));
    assert!(matches!(
        verdict,
        Verdict::Accepted(Acceptance::Frames { frames: 2, .. })
    ));
}

#[test]
fn ogg_rejected_regardless_of_content() {
    let mut data = b"OggS".to_vec();
    data.extend_from_slice(&frames(10));

    let verdict = Detector::default().probe(&mut Cursor::new(data));
    assert!(matches!(verdict, Verdict::Rejected(ProbeError::OggStream)));
}

#[test]
fn riff_rmp3_accepted_by_signature() {
    let mut data = b"RIFF\x00\x10\x00\x00RMP3data".to_vec();
    data.resize(64, 0);

    let verdict = Detector::default().probe(&mut Cursor::new(data));
    assert!(matches!(verdict, Verdict::Accepted(Acceptance::RiffRmp3)));
}

#[test]
fn id3_tag_skipped_exactly() -> Result<()> {
    // Tag body full of sync bytes: any misaligned landing would need a resync.
    let mut data = id3_tag(300, 0xFF);
    data.extend_from_slice(&frames(3));

    let (acceptance, state) = run_steps(data)?;

    assert_eq!(state.attempts(), 0);
    let Acceptance::Frames { offset, frames, .. } = acceptance else {
        panic!("expected frame acceptance");
    };
    assert_eq!(offset, 310);
    assert_eq!(frames, 3);
    Ok(())
}

#[test]
fn id3_tag_larger_than_window() -> Result<()> {
    // 0x1234 needs more than one synchsafe byte.
    let mut data = id3_tag(0x1234, 0xAA);
    data.extend_from_slice(&frames(3));

    let (acceptance, state) = run_steps(data)?;

    assert_eq!(state.attempts(), 0);
    assert!(matches!(
        acceptance,
        Acceptance::Frames { offset, .. } if offset == 10 + 0x1234
    ));
    Ok(())
}

#[test]
fn isolated_headers_exhaust_attempts() {
    // Valid headers that never chain into a second frame.
    let mut block = vec![0u8; 2000];
    block[..4].copy_from_slice(&HEADER_128K);
    let data = block.repeat(12);

    let verdict = Detector::default().probe(&mut Cursor::new(data));
    assert!(matches!(
        verdict,
        Verdict::Rejected(ProbeError::AttemptsExceeded(8))
    ));
}

#[test]
fn random_bytes_rejected() {
    let data = xorshift_bytes(1 << 20, 0x9E37_79B9_7F4A_7C15);

    let verdict = Detector::default().probe(&mut Cursor::new(data));
    assert!(matches!(
        verdict,
        Verdict::Rejected(ProbeError::AttemptsExceeded(8))
    ));
}

#[test]
fn attempt_ceiling_is_configurable() {
    let mut block = vec![0u8; 2000];
    block[..4].copy_from_slice(&HEADER_128K);
    let data = block.repeat(12);

    let detector = Detector::new(DetectorConfig {
        max_resync_attempts: 2,
        ..Default::default()
    });
    assert!(matches!(
        detector.probe(&mut Cursor::new(data)),
        Verdict::Rejected(ProbeError::AttemptsExceeded(2))
    ));
}

#[test]
fn corrupt_frame_after_lock_recovers() {
    // Two frames, a damaged third header, then a clean run.
    let mut data = frames(2);
    let mut damaged = frames(1);
    damaged[1] = 0x00;
    data.extend_from_slice(&damaged);
    data.extend_from_slice(&frames(3));

    assert!(Detector::default().detect(&mut Cursor::new(data)));
}

#[test]
fn verdict_is_idempotent() -> Result<()> {
    let detector = Detector::default();

    let mut inputs = vec![frames(4), frames(2), xorshift_bytes(64 << 10, 7)];
    let mut tagged = id3_tag(100, 0);
    tagged.extend_from_slice(&frames(3));
    inputs.push(tagged);

    for data in inputs {
        let mut src = Cursor::new(data);
        let first = detector.detect(&mut src);
        src.seek(SeekFrom::Start(0))?;
        let second = detector.detect(&mut src);

        assert_eq!(first, second);
    }
    Ok(())
}

#[test]
fn extension_filter_before_probe() {
    assert!(is_mpeg_audio("song.mp3", &mut Cursor::new(frames(3))));
    assert!(!is_mpeg_audio("song.flac", &mut Cursor::new(frames(3))));
    assert!(!is_mpeg_audio("song.TTA", &mut Cursor::new(frames(3))));
}
