use std::fmt;

/// Header bit field named by a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Version,
    Layer,
    BitRateIndex,
    SampleRateIndex,
    BitRate,
    SampleRate,
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderField::Version => write!(f, "version"),
            HeaderField::Layer => write!(f, "layer"),
            HeaderField::BitRateIndex => write!(f, "bitrate_index"),
            HeaderField::SampleRateIndex => write!(f, "sampling_frequency_index"),
            HeaderField::BitRate => write!(f, "bitrate"),
            HeaderField::SampleRate => write!(f, "sampling_frequency"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Invalid frame sync. Read {0:#010X}")]
    SyncMismatch(u32),

    #[error("Reserved value in {0}")]
    ReservedField(HeaderField),

    #[error("No table entry for {0}")]
    UnresolvedRate(HeaderField),

    #[error("Layer II does not allow {bit_rate} kbps with channel mode {mode}")]
    IllegalLayer2Combo { bit_rate: u32, mode: u8 },
}

#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("Insufficient buffer data for header check: {available} < {required} bytes")]
    InsufficientData { available: usize, required: usize },

    #[error("Refill at stream offset {0:#X} returned no data")]
    StreamExhausted(u64),

    #[error("No stable frame sequence after {0} resync attempts")]
    AttemptsExceeded(usize),

    #[error("Ogg bitstream signature found")]
    OggStream,

    #[error("Filename extension .{0} is not MPEG audio")]
    RejectedExtension(String),

    #[error("I/O error while probing: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Whether the error ended the probe from inside the state machine rather
    /// than from a container signature or the filename.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProbeError::StreamExhausted(_) | ProbeError::AttemptsExceeded(_) | ProbeError::Io(_)
        )
    }
}
