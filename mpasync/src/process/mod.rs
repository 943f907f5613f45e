use std::io::{self, Read, Seek, SeekFrom};

/// Buffered window over the probed stream.
///
/// Provides the [`Window`](window::Window) that isolates stream reads and
/// seeks from the header search.
pub mod window;

/// Frame sync detection.
///
/// Provides the [`Detector`](detect::Detector) state machine deciding whether
/// a stream is MPEG audio.
pub mod detect;

/// Frame walking after detection.
///
/// Provides the [`FrameWalker`](scan::FrameWalker) and the
/// [`StreamSummary`](scan::StreamSummary) built from it.
pub mod scan;

use crate::process::detect::{Detector, Verdict};
use crate::utils::errors::ProbeError;

/// Filename extensions of formats that may start with an ID3 tag but are
/// never MPEG audio.
pub const REJECTED_EXTENSIONS: [&str; 5] = ["flac", "mpc", "tta", "ogg", "wma"];

/// Readable, seekable input of the prober.
///
/// `tell` is [`Seek::stream_position`].
pub trait ByteSource: Read + Seek {
    /// Network streams are accepted after fewer matching frames.
    fn is_streaming(&self) -> bool {
        false
    }
}

impl<T: AsRef<[u8]>> ByteSource for io::Cursor<T> {}

impl ByteSource for std::fs::File {}

impl<R: Read + Seek> ByteSource for io::BufReader<R> {}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn is_streaming(&self) -> bool {
        (**self).is_streaming()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn is_streaming(&self) -> bool {
        (**self).is_streaming()
    }
}

/// Marks a source as a network stream.
#[derive(Debug)]
pub struct Streaming<R> {
    inner: R,
}

impl<R> Streaming<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Streaming<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for Streaming<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<R: Read + Seek> ByteSource for Streaming<R> {
    fn is_streaming(&self) -> bool {
        true
    }
}

/// Returns the extension of `name` if it names a known non-MPEG format.
///
/// Matches case-insensitively on the text after the last `.`, so URIs work
/// as well as paths.
pub fn rejected_extension(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    REJECTED_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
        .then_some(ext)
}

/// Probes `src` unless `name` carries a rejected extension.
pub fn probe_named<S: ByteSource + ?Sized>(detector: &Detector, name: &str, src: &mut S) -> Verdict {
    if let Some(ext) = rejected_extension(name) {
        return Verdict::Rejected(ProbeError::RejectedExtension(ext.to_string()));
    }

    detector.probe(src)
}

/// Returns `true` if `src`, opened from `name`, is MPEG audio.
pub fn is_mpeg_audio<S: ByteSource + ?Sized>(name: &str, src: &mut S) -> bool {
    probe_named(&Detector::default(), name, src).is_accepted()
}

#[test]
fn extension_filter() {
    assert_eq!(rejected_extension("track.flac"), Some("flac"));
    assert_eq!(rejected_extension("TRACK.OGG"), Some("OGG"));
    assert_eq!(rejected_extension("http://host/a.b/stream.Wma"), Some("Wma"));
    assert_eq!(rejected_extension("song.mp3"), None);
    assert_eq!(rejected_extension("no_extension"), None);
    assert_eq!(rejected_extension("archive.flac.mp3"), None);
}

#[test]
fn rejected_extension_reads_nothing() {
    let mut src = io::Cursor::new(vec![0xFFu8, 0xFB, 0x90, 0x64]);
    let verdict = probe_named(&Detector::default(), "a.mpc", &mut src);

    assert!(matches!(
        verdict,
        Verdict::Rejected(ProbeError::RejectedExtension(ref ext)) if ext == "mpc"
    ));
    assert_eq!(src.position(), 0);
}
