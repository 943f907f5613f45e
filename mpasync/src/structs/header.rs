//! MPEG audio frame header.
//!
//! ## Layout (32 bits, MSB first)
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! ```
//!
//! | Bits  | Field                                               |
//! |-------|-----------------------------------------------------|
//! | 21-31 | frame sync, all ones                                |
//! | 19-20 | version: 00 = 2.5, 01 = reserved, 10 = 2, 11 = 1    |
//! | 17-18 | layer: 00 = reserved, 01 = III, 10 = II, 11 = I     |
//! | 16    | protection bit, clear when a 16-bit CRC follows     |
//! | 12-15 | bitrate index                                       |
//! | 10-11 | sampling frequency index                            |
//! | 9     | padding                                             |
//! | 6-7   | channel mode                                        |
//!
//! Decoding is pure: the same word always yields the same result.

use std::fmt::Display;

use crate::utils::errors::{HeaderError, HeaderField};

/// Bits 21-31 of every frame header.
pub const FRAME_SYNC_MASK: u32 = 0xFFE0_0000;

/// Bitrates in kbps, 0 where the index has no bitrate.
///
/// Rows: MPEG-1 layer I, II, III, then MPEG-2/2.5 layer I, then MPEG-2/2.5
/// layers II and III.
const BIT_RATE_TABLE: [[u32; 16]; 5] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
];

/// Sampling frequencies in Hz indexed by `[version code][index]`.
const SAMPLE_RATE_TABLE: [[u32; 4]; 4] = [
    [11025, 12000, 8000, 0],
    [0, 0, 0, 0],
    [22050, 24000, 16000, 0],
    [44100, 48000, 32000, 0],
];

/// Layer II bitrates not allowed outside single channel mode.
const LAYER2_STEREO_EXCLUDED: [u32; 5] = [32, 40, 48, 56, 80];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegVersion {
    Mpeg25,
    Mpeg2,
    Mpeg1,
}

impl MpegVersion {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(MpegVersion::Mpeg25),
            2 => Some(MpegVersion::Mpeg2),
            3 => Some(MpegVersion::Mpeg1),
            _ => None,
        }
    }

    /// The two version bits as stored in the header.
    pub fn code(self) -> usize {
        match self {
            MpegVersion::Mpeg25 => 0,
            MpegVersion::Mpeg2 => 2,
            MpegVersion::Mpeg1 => 3,
        }
    }
}

impl Display for MpegVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MpegVersion::Mpeg25 => write!(f, "MPEG-2.5"),
            MpegVersion::Mpeg2 => write!(f, "MPEG-2"),
            MpegVersion::Mpeg1 => write!(f, "MPEG-1"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    SingleChannel,
}

impl ChannelMode {
    fn from_code(code: u32) -> Self {
        match code & 3 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::SingleChannel,
        }
    }

    pub fn channels(self) -> u32 {
        match self {
            ChannelMode::SingleChannel => 1,
            _ => 2,
        }
    }
}

impl Display for ChannelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelMode::Stereo => write!(f, "Stereo"),
            ChannelMode::JointStereo => write!(f, "Joint stereo"),
            ChannelMode::DualChannel => write!(f, "Dual channel"),
            ChannelMode::SingleChannel => write!(f, "Single channel"),
        }
    }
}

/// Attributes of one validated frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    /// 1, 2 or 3.
    pub layer: u8,
    /// Low sampling frequency, set for MPEG-2 and MPEG-2.5.
    pub lsf: bool,
    pub has_crc: bool,
    /// kbps.
    pub bit_rate: u32,
    /// Hz.
    pub sample_rate: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
    /// Frame length in bytes including the header.
    pub frame_size: u32,
}

impl FrameHeader {
    /// Validates a candidate header word and extracts its attributes.
    ///
    /// Checks run in a fixed order so the first failing field names the
    /// rejection: sync, layer, bitrate index, sampling frequency index,
    /// version, bitrate table, layer II mode restriction, sampling frequency
    /// table.
    pub fn decode(word: u32) -> Result<Self, HeaderError> {
        if word & FRAME_SYNC_MASK != FRAME_SYNC_MASK {
            return Err(HeaderError::SyncMismatch(word));
        }

        // Bit 20 clear marks MPEG-2.5 whatever bit 19 says.
        let lsf = if (word >> 20) & 1 != 0 {
            (word >> 19) & 1 == 0
        } else {
            true
        };

        let layer_code = (word >> 17) & 3;
        if layer_code == 0 {
            return Err(HeaderError::ReservedField(HeaderField::Layer));
        }
        let layer = (4 - layer_code) as u8;

        let has_crc = (word >> 16) & 1 == 0;

        let bit_rate_index = ((word >> 12) & 0xF) as usize;
        if bit_rate_index == 0 || bit_rate_index == 0xF {
            return Err(HeaderError::ReservedField(HeaderField::BitRateIndex));
        }

        let sample_rate_index = ((word >> 10) & 3) as usize;
        if sample_rate_index == 3 {
            return Err(HeaderError::ReservedField(HeaderField::SampleRateIndex));
        }

        let version = MpegVersion::from_code((word >> 19) & 3)
            .ok_or(HeaderError::ReservedField(HeaderField::Version))?;

        let row = match version {
            MpegVersion::Mpeg1 => layer as usize - 1,
            _ if layer == 1 => 3,
            _ => 4,
        };
        let bit_rate = BIT_RATE_TABLE[row][bit_rate_index];
        if bit_rate == 0 {
            return Err(HeaderError::UnresolvedRate(HeaderField::BitRate));
        }

        let channel_mode = ChannelMode::from_code(word >> 6);
        if layer == 2 {
            let illegal = match channel_mode {
                ChannelMode::SingleChannel => bit_rate > 192,
                _ => LAYER2_STEREO_EXCLUDED.contains(&bit_rate),
            };
            if illegal {
                return Err(HeaderError::IllegalLayer2Combo {
                    bit_rate,
                    mode: ((word >> 6) & 3) as u8,
                });
            }
        }

        let sample_rate = SAMPLE_RATE_TABLE[version.code()][sample_rate_index];
        if sample_rate == 0 {
            return Err(HeaderError::UnresolvedRate(HeaderField::SampleRate));
        }

        let padding = (word >> 9) & 1;
        let frame_size = match layer {
            1 => (12_000 * bit_rate / sample_rate + padding) * 4,
            2 => 144_000 * bit_rate / sample_rate + padding,
            _ => 144_000 * bit_rate / (sample_rate << lsf as u32) + padding,
        };

        Ok(Self {
            version,
            layer,
            lsf,
            has_crc,
            bit_rate,
            sample_rate,
            padding: padding != 0,
            channel_mode,
            frame_size,
        })
    }

    /// Reads a big-endian header word from the first four bytes of `bytes`.
    pub fn word_at(bytes: &[u8]) -> Option<u32> {
        let word: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(u32::from_be_bytes(word))
    }

    /// Whether `other` belongs to the same elementary stream.
    ///
    /// Bitrate, padding and channel mode may change from frame to frame.
    pub fn matches(&self, other: &FrameHeader) -> bool {
        self.sample_rate == other.sample_rate
            && self.layer == other.layer
            && self.version == other.version
    }

    pub fn samples_per_frame(&self) -> u32 {
        match self.layer {
            1 => 384,
            3 if self.lsf => 576,
            _ => 1152,
        }
    }

    /// Frame duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples_per_frame() as f64 / self.sample_rate as f64
    }
}

impl Display for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} layer {}, {} kbps, {} Hz, {}",
            self.version, self.layer, self.bit_rate, self.sample_rate, self.channel_mode
        )
    }
}
