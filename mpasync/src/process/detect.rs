use log::{debug, trace};

use crate::process::ByteSource;
use crate::process::window::{DEFAULT_WINDOW_SIZE, Window};
use crate::structs::header::FrameHeader;
use crate::structs::marker::LeadingMarker;
use crate::utils::errors::ProbeError;

/// Tunables of the frame sync search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Capacity of the probe window.
    pub window_size: usize,
    /// Bytes that must be buffered ahead of the cursor for the leading
    /// signature check and for every header fetch.
    pub min_window_bytes: usize,
    /// Consecutive matching frames needed to accept a local file.
    pub accept_frames: usize,
    /// Consecutive matching frames needed to accept a network stream.
    pub accept_frames_streaming: usize,
    /// Bytes searched for the next header after a bad frame in a stream that
    /// already had two good ones. Zero leaves that search unbounded.
    pub quick_resync_bytes: usize,
    /// Full resynchronizations before giving up.
    pub max_resync_attempts: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_window_bytes: 16,
            accept_frames: 3,
            accept_frames_streaming: 2,
            quick_resync_bytes: 32,
            max_resync_attempts: 8,
        }
    }
}

impl DetectorConfig {
    /// Window capacity actually allocated. A window smaller than the fetch
    /// minimum could never hold a candidate.
    pub fn window_capacity(&self) -> usize {
        self.window_size.max(self.min_window_bytes)
    }

    fn quick_resync_budget(&self) -> Option<usize> {
        (self.quick_resync_bytes > 0).then_some(self.quick_resync_bytes)
    }

    fn accept_threshold(&self, streaming: bool) -> usize {
        let frames = if streaming {
            self.accept_frames_streaming
        } else {
            self.accept_frames
        };

        // The first match only sets the reference frame.
        frames.max(2)
    }
}

/// Why a probe accepted its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// A run of frames with matching version, layer and sampling frequency.
    Frames {
        /// First frame of the run; later frames agree with it.
        header: FrameHeader,
        /// Stream offset of the first frame of the run.
        offset: u64,
        /// Frames validated in the run.
        frames: usize,
    },
    /// RIFF container with an RMP3 form type.
    RiffRmp3,
}

/// Outcome of one probe.
#[derive(Debug)]
pub enum Verdict {
    Accepted(Acceptance),
    Rejected(ProbeError),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    pub fn acceptance(&self) -> Option<&Acceptance> {
        match self {
            Verdict::Accepted(acceptance) => Some(acceptance),
            Verdict::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Refill,
    CheckLeadingMarkers,
    FetchCandidate,
    ValidateCandidate,
    AdvancePastFrame,
    Resync,
    ResyncScan,
}

/// Working data of one probe. Created per call and dropped on every exit.
#[derive(Debug)]
pub struct ScanState {
    mode: ScanMode,
    /// Mode entered after the next refill.
    resume: ScanMode,
    window: Window,
    /// Rolling header word, also the candidate under validation.
    head: u32,
    consecutive_matches: usize,
    /// First frame of the current run.
    previous: Option<FrameHeader>,
    run_offset: u64,
    /// `None` while the byte scan is unbounded.
    resync_budget: Option<usize>,
    attempts: usize,
    /// Distance from the cursor to the next candidate header.
    skip: usize,
    threshold: usize,
}

impl ScanState {
    pub fn new(config: &DetectorConfig, streaming: bool) -> Self {
        Self {
            mode: ScanMode::Refill,
            resume: ScanMode::CheckLeadingMarkers,
            window: Window::with_capacity(config.window_capacity()),
            head: 0,
            consecutive_matches: 0,
            previous: None,
            run_offset: 0,
            resync_budget: None,
            attempts: 0,
            skip: 0,
            threshold: config.accept_threshold(streaming),
        }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn consecutive_matches(&self) -> usize {
        self.consecutive_matches
    }
}

/// Decides whether a byte stream is an MPEG audio elementary stream.
///
/// The detector holds configuration only; every call builds its own
/// [`ScanState`], so one detector may probe many streams concurrently.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use mpasync::process::detect::Detector;
///
/// // Three MPEG-1 layer III frames, 128 kbps at 44.1 kHz.
/// let mut stream = Vec::new();
/// for _ in 0..3 {
///     let mut frame = vec![0u8; 417];
///     frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
///     stream.extend_from_slice(&frame);
/// }
///
/// assert!(Detector::default().detect(&mut Cursor::new(stream)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        if config.window_size < config.min_window_bytes {
            debug!(
                "Window of {} bytes raised to the {} byte fetch minimum",
                config.window_size, config.min_window_bytes
            );
        }

        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns `true` if `src` looks like MPEG audio.
    ///
    /// The stream cursor is left wherever the scan stopped; rewind before
    /// decoding.
    pub fn detect<S: ByteSource + ?Sized>(&self, src: &mut S) -> bool {
        self.probe(src).is_accepted()
    }

    /// Like [`Detector::detect`], keeping the reason for the decision.
    pub fn probe<S: ByteSource + ?Sized>(&self, src: &mut S) -> Verdict {
        let mut state = ScanState::new(&self.config, src.is_streaming());

        let verdict = match self.run(src, &mut state) {
            Ok(acceptance) => Verdict::Accepted(acceptance),
            Err(e) => Verdict::Rejected(e),
        };

        match &verdict {
            Verdict::Accepted(acceptance) => debug!("Accepted: {acceptance:?}"),
            Verdict::Rejected(e) => debug!("Rejected: {e}"),
        }

        verdict
    }

    fn run<S: ByteSource + ?Sized>(
        &self,
        src: &mut S,
        state: &mut ScanState,
    ) -> Result<Acceptance, ProbeError> {
        loop {
            if state.attempts >= self.config.max_resync_attempts {
                return Err(ProbeError::AttemptsExceeded(state.attempts));
            }

            if let Some(acceptance) = self.step(src, state)? {
                return Ok(acceptance);
            }
        }
    }

    /// Runs the current mode once and moves to the next.
    ///
    /// Returns `Ok(Some(_))` on acceptance and `Err(_)` on rejection.
    pub fn step<S: ByteSource + ?Sized>(
        &self,
        src: &mut S,
        state: &mut ScanState,
    ) -> Result<Option<Acceptance>, ProbeError> {
        let min = self.config.min_window_bytes;

        state.mode = match state.mode {
            ScanMode::Refill => {
                state.window.refill(src)?;
                state.resume
            }

            ScanMode::CheckLeadingMarkers => {
                if state.window.remaining() < min {
                    let e = ProbeError::InsufficientData {
                        available: state.window.remaining(),
                        required: min,
                    };
                    debug!("Leading check skipped: {e}");
                    ScanMode::Resync
                } else {
                    match LeadingMarker::inspect(state.window.rest()) {
                        LeadingMarker::Id3v2(tag) => {
                            debug!("ID3v2.{} tag, skipping {} bytes", tag.major, tag.total_len());
                            state.skip = tag.total_len();
                            ScanMode::AdvancePastFrame
                        }
                        LeadingMarker::Ogg => return Err(ProbeError::OggStream),
                        LeadingMarker::RiffRmp3 => return Ok(Some(Acceptance::RiffRmp3)),
                        LeadingMarker::None => ScanMode::FetchCandidate,
                    }
                }
            }

            ScanMode::FetchCandidate => {
                match FrameHeader::word_at(state.window.rest()) {
                    Some(word) if state.window.remaining() >= min => {
                        trace!("Candidate at {:#010X}", state.window.position());
                        state.head = word;
                        ScanMode::ValidateCandidate
                    }
                    _ => {
                        let e = ProbeError::InsufficientData {
                            available: state.window.remaining(),
                            required: min,
                        };
                        debug!("Header fetch at {:#010X}: {e}", state.window.position());
                        ScanMode::Resync
                    }
                }
            }

            ScanMode::ValidateCandidate => match FrameHeader::decode(state.head) {
                Ok(frame) => {
                    state.consecutive_matches += 1;
                    state.skip = frame.frame_size as usize;

                    match state.previous {
                        Some(first) if state.consecutive_matches > 1 => {
                            if !first.matches(&frame) {
                                debug!(
                                    "Frame at {:#010X} does not match the run: {frame}",
                                    state.window.position()
                                );
                                ScanMode::Resync
                            } else if state.consecutive_matches >= state.threshold {
                                return Ok(Some(Acceptance::Frames {
                                    header: first,
                                    offset: state.run_offset,
                                    frames: state.consecutive_matches,
                                }));
                            } else {
                                trace!("Match {}: {frame}", state.consecutive_matches);
                                ScanMode::AdvancePastFrame
                            }
                        }
                        _ => {
                            trace!("First frame at {:#010X}: {frame}", state.window.position());
                            state.previous = Some(frame);
                            state.run_offset = state.window.position();
                            ScanMode::AdvancePastFrame
                        }
                    }
                }
                Err(e) => {
                    trace!("{e}");
                    if state.consecutive_matches >= 2 {
                        // Keep the run and search a few bytes past the bad header.
                        state.resync_budget = self.config.quick_resync_budget();
                        state.window.advance(4);
                        ScanMode::ResyncScan
                    } else {
                        ScanMode::Resync
                    }
                }
            },

            ScanMode::AdvancePastFrame => {
                if state.window.skip(src, state.skip, min)? {
                    state.resume = ScanMode::FetchCandidate;
                    ScanMode::Refill
                } else {
                    ScanMode::FetchCandidate
                }
            }

            ScanMode::Resync => {
                state.attempts += 1;
                debug!(
                    "Resync attempt {} at {:#010X}",
                    state.attempts,
                    state.window.position()
                );
                state.head = 0;
                state.consecutive_matches = 0;
                state.resync_budget = None;
                ScanMode::ResyncScan
            }

            ScanMode::ResyncScan => self.resync_scan(state),
        };

        Ok(None)
    }

    fn resync_scan(&self, state: &mut ScanState) -> ScanMode {
        while let Some(byte) = state.window.next_byte() {
            state.head = (state.head << 8) | byte as u32;

            if FrameHeader::decode(state.head).is_ok() {
                state.window.rewind(4);
                trace!("Resync found header at {:#010X}", state.window.position());
                return ScanMode::ValidateCandidate;
            }

            if let Some(budget) = state.resync_budget.as_mut() {
                *budget = budget.saturating_sub(1);
                if *budget == 0 {
                    // Rescan the last byte with a cleared word.
                    state.window.rewind(1);
                    return ScanMode::Resync;
                }
            }
        }

        state.resume = ScanMode::ResyncScan;
        ScanMode::Refill
    }
}
