#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Frame sync detection for MPEG audio elementary streams.
//!
//! ### Frame Headers
//!
//! Every frame starts with a 32-bit header: 11 sync bits followed by the
//! version, layer, protection, bitrate, sampling frequency, padding and
//! channel mode fields. Frame length follows from bitrate, sampling
//! frequency, layer and padding.
//!
//! ### Detection
//!
//! A stream is accepted once three consecutive frames (two for network
//! streams) agree on version, layer and sampling frequency. Leading ID3v2
//! tags are skipped, Ogg streams are rejected and RIFF/RMP3 files accepted
//! from their signature alone. After a bad header the search resumes byte by
//! byte, with a short bounded search when a run of good frames was already
//! seen, and gives up after a fixed number of full resynchronizations.
//!
//! ## Quick Start
//!
//! 1. Probe a stream with [`process::detect::Detector`]
//! 2. Walk the frames of an accepted stream with [`process::scan::FrameWalker`]
//!
//! ```rust
//! use std::io::{Cursor, Seek, SeekFrom};
//! use mpasync::process::detect::{Acceptance, Detector, Verdict};
//! use mpasync::process::scan::StreamSummary;
//!
//! let mut frame = vec![0u8; 417];
//! frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
//! let mut src = Cursor::new(frame.repeat(10));
//!
//! if let Verdict::Accepted(Acceptance::Frames { header, offset, .. }) =
//!     Detector::default().probe(&mut src)
//! {
//!     println!("{header}");
//!
//!     src.seek(SeekFrom::Start(0))?;
//!     let summary = StreamSummary::collect(&mut src, offset, None)?;
//!     assert_eq!(summary.map(|s| s.frame_count), Some(10));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Stream probing.
///
/// 1. **Windowing** ([`process::window`]): Bounded reads and seeks over the
///    input.
///
/// 2. **Detection** ([`process::detect`]): Frame sync state machine.
///
/// 3. **Scanning** ([`process::scan`]): Frame walking and stream summaries.
pub mod process;

/// Data structures representing format components.
///
/// - **Frame Headers** ([`structs::header`]): Header decoding and validation
/// - **Leading Markers** ([`structs::marker`]): ID3v2, Ogg and RIFF/RMP3 signatures
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
