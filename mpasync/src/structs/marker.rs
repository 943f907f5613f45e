//! Signatures that may precede or replace an MPEG audio elementary stream.
//!
//! - **ID3v2** (`"ID3"`): tag prepended to the stream, skipped by size.
//! - **Ogg** (`"OggS"`): never MPEG audio.
//! - **RIFF/RMP3** (`"RIFF"....` + `"RMP3"`): MPEG audio wrapped in RIFF.

use std::io;

use crate::utils::bitstream_io::BsIoSliceReader;

pub const ID3V2_MAGIC: &[u8; 3] = b"ID3";
pub const OGG_MAGIC: &[u8; 4] = b"OggS";
pub const RIFF_MAGIC: &[u8; 4] = b"RIFF";
pub const RMP3_FORM: &[u8; 4] = b"RMP3";

/// Length of the fixed ID3v2 tag header.
pub const ID3V2_HEADER_LEN: usize = 10;

/// Fixed ten byte header of an ID3v2 tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v2Header {
    pub major: u8,
    pub revision: u8,
    pub flags: u8,
    /// Tag length after the header, decoded from a synchsafe integer.
    pub size: u32,
}

impl Id3v2Header {
    pub fn read(reader: &mut BsIoSliceReader) -> io::Result<Self> {
        let magic: u32 = reader.get_n(24)?;
        if magic.to_be_bytes()[1..] != ID3V2_MAGIC[..] {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid ID3v2 magic. Read {magic:#08X}"),
            ));
        }

        let major = reader.get_n(8)?;
        let revision = reader.get_n(8)?;
        let flags = reader.get_n(8)?;

        // Synchsafe: the top bit of every byte is ignored.
        let mut size = 0u32;
        for _ in 0..4 {
            reader.skip_n(1)?;
            size = (size << 7) | reader.get_n::<u32>(7)?;
        }

        Ok(Self {
            major,
            revision,
            flags,
            size,
        })
    }

    /// Bytes from the start of the tag to the first byte after it.
    pub fn total_len(&self) -> usize {
        ID3V2_HEADER_LEN + self.size as usize
    }
}

/// What the first bytes of a stream announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadingMarker {
    Id3v2(Id3v2Header),
    Ogg,
    RiffRmp3,
    None,
}

impl LeadingMarker {
    pub fn inspect(bytes: &[u8]) -> Self {
        if bytes.starts_with(ID3V2_MAGIC) {
            let reader = &mut BsIoSliceReader::from_slice(bytes);
            if let Ok(header) = Id3v2Header::read(reader) {
                return LeadingMarker::Id3v2(header);
            }
        }

        if bytes.starts_with(OGG_MAGIC) {
            return LeadingMarker::Ogg;
        }

        if bytes.starts_with(RIFF_MAGIC) && bytes.get(8..12) == Some(&RMP3_FORM[..]) {
            return LeadingMarker::RiffRmp3;
        }

        LeadingMarker::None
    }
}
