use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;

use anyhow::{Context, Result};
use mpasync::process::{ByteSource, Streaming};

/// Probe input opened from a file path or from stdin.
pub struct InputSource {
    source: Box<dyn ByteSource>,
    name: String,
    is_pipe: bool,
}

impl InputSource {
    /// Opens `input_path`. Use "-" for stdin.
    ///
    /// Stdin cannot seek, so it is read to the end up front and probed as a
    /// network stream.
    pub fn open<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let input_path = input_path.as_ref();
        let name = input_path.to_string_lossy().into_owned();
        let is_pipe = name == "-";

        let source: Box<dyn ByteSource> = if is_pipe {
            let mut data = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut data)
                .context("Failed to read stdin")?;
            log::debug!("Buffered {} bytes from stdin", data.len());
            Box::new(Streaming::new(Cursor::new(data)))
        } else {
            let file = File::open(input_path)
                .with_context(|| format!("Failed to open {}", input_path.display()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self {
            source,
            name,
            is_pipe,
        })
    }

    /// Flags the input as a network stream regardless of where it came from.
    pub fn into_streaming(self) -> Self {
        if self.source.is_streaming() {
            return self;
        }

        Self {
            source: Box::new(Streaming::new(self.source)),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    pub fn source(&mut self) -> &mut dyn ByteSource {
        self.source.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom, Write};

    #[test]
    fn file_input_is_local() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&[0xFF, 0xFB, 0x90, 0x64])?;

        let mut input = InputSource::open(file.path())?;
        assert!(!input.is_pipe());
        assert!(!input.source().is_streaming());

        let mut word = [0u8; 4];
        input.source().read_exact(&mut word)?;
        assert_eq!(word, [0xFF, 0xFB, 0x90, 0x64]);

        input.source().seek(SeekFrom::Start(1))?;
        input.source().read_exact(&mut word[..1])?;
        assert_eq!(word[0], 0xFB);
        Ok(())
    }

    #[test]
    fn streaming_override() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        let name = file.path().to_string_lossy().into_owned();

        let mut input = InputSource::open(file.path())?.into_streaming();
        assert!(input.source().is_streaming());
        assert_eq!(input.name(), name);
        Ok(())
    }

    #[test]
    fn missing_file_reports_path() {
        let Err(e) = InputSource::open("/nonexistent/track.mp3") else {
            panic!("expected an open error");
        };
        assert!(e.to_string().contains("/nonexistent/track.mp3"));
    }
}
