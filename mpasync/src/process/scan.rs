use std::io::{self, Read, Seek, SeekFrom};

use anyhow::{Context, Result};
use log::{debug, trace};

use crate::structs::header::FrameHeader;

/// Walks back-to-back frames from a known frame offset.
///
/// Each item is the stream offset and header of one frame. The walk ends at
/// end of stream or at the first word that is not a valid header matching
/// the first frame, such as a trailing ID3v1 tag.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use mpasync::process::scan::FrameWalker;
///
/// let mut frame = vec![0u8; 417];
/// frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
/// let mut src = Cursor::new(frame.repeat(4));
///
/// let offsets: Vec<u64> = FrameWalker::new(&mut src, 0)
///     .map(|frame| frame.map(|(offset, _)| offset))
///     .collect::<std::io::Result<_>>()?;
/// assert_eq!(offsets, [0, 417, 834, 1251]);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct FrameWalker<'a, S: ?Sized> {
    src: &'a mut S,
    offset: u64,
    first: Option<FrameHeader>,
    done: bool,
}

impl<'a, S: Read + Seek + ?Sized> FrameWalker<'a, S> {
    pub fn new(src: &'a mut S, offset: u64) -> Self {
        Self {
            src,
            offset,
            first: None,
            done: false,
        }
    }

    fn read_word(&mut self) -> io::Result<Option<u32>> {
        self.src.seek(SeekFrom::Start(self.offset))?;

        let mut word = [0u8; 4];
        match self.src.read_exact(&mut word) {
            Ok(()) => Ok(Some(u32::from_be_bytes(word))),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<S: Read + Seek + ?Sized> Iterator for FrameWalker<'_, S> {
    type Item = io::Result<(u64, FrameHeader)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let word = match self.read_word() {
            Ok(Some(word)) => word,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let header = match FrameHeader::decode(word) {
            Ok(header) if self.first.is_none_or(|first| first.matches(&header)) => header,
            Ok(header) => {
                debug!("Frame at {:#010X} leaves the stream: {header}", self.offset);
                self.done = true;
                return None;
            }
            Err(e) => {
                trace!("End of frames at {:#010X}: {e}", self.offset);
                self.done = true;
                return None;
            }
        };

        self.first.get_or_insert(header);
        let offset = self.offset;
        self.offset += header.frame_size as u64;

        Some(Ok((offset, header)))
    }
}

/// Aggregate parameters of a frame run.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    pub first: FrameHeader,
    pub offset: u64,
    pub frame_count: usize,
    pub total_bytes: u64,
    pub min_bit_rate: u32,
    pub max_bit_rate: u32,
    /// Mean of per-frame bitrates in kbps.
    pub avg_bit_rate: u32,
    /// Seconds.
    pub duration: f64,
    /// Set when the run stopped at `max_frames` rather than at its end.
    pub truncated: bool,
}

impl StreamSummary {
    /// Whether frames use more than one bitrate.
    pub fn is_vbr(&self) -> bool {
        self.min_bit_rate != self.max_bit_rate
    }

    /// Walks at most `max_frames` frames from `offset`.
    ///
    /// Returns `None` if no frame starts at `offset`.
    pub fn collect<S: Read + Seek + ?Sized>(
        src: &mut S,
        offset: u64,
        max_frames: Option<usize>,
    ) -> Result<Option<Self>> {
        let mut summary: Option<Self> = None;
        let mut bit_rate_sum = 0u64;

        for frame in FrameWalker::new(src, offset) {
            let (frame_offset, header) =
                frame.with_context(|| format!("Failed to walk frames from {offset:#X}"))?;

            let summary = summary.get_or_insert_with(|| Self {
                first: header,
                offset: frame_offset,
                frame_count: 0,
                total_bytes: 0,
                min_bit_rate: header.bit_rate,
                max_bit_rate: header.bit_rate,
                avg_bit_rate: 0,
                duration: 0.0,
                truncated: false,
            });

            if max_frames.is_some_and(|max| summary.frame_count >= max) {
                summary.truncated = true;
                break;
            }

            summary.frame_count += 1;
            summary.total_bytes += header.frame_size as u64;
            summary.min_bit_rate = summary.min_bit_rate.min(header.bit_rate);
            summary.max_bit_rate = summary.max_bit_rate.max(header.bit_rate);
            summary.duration += header.duration();
            bit_rate_sum += header.bit_rate as u64;
        }

        if let Some(summary) = summary.as_mut() {
            summary.avg_bit_rate = (bit_rate_sum / summary.frame_count.max(1) as u64) as u32;
        }

        Ok(summary)
    }
}
