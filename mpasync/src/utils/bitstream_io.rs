//! Bitstream I/O utilities for header parsing.
//!
//! Thin wrapper over `bitstream-io` reading MSB-first bit fields from byte
//! slices, used for container and tag headers ahead of the audio frames.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "get_n({}): out of bounds bits at {}",
                    n,
                    self.bs.position_in_bits().unwrap_or(0)
                ),
            )),
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        if n as u64 > self.available()? {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "skip_n: out of bounds bits",
            ));
        }

        self.bs.skip(n)
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|pos| self.len - pos)
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

#[test]
fn header_fields() -> io::Result<()> {
    let bytes = [0xFF, 0xFB, 0x90, 0x64];
    let mut reader = BsIoSliceReader::from_slice(&bytes);

    assert_eq!(reader.get_n::<u16>(11)?, 0x7FF);
    assert_eq!(reader.get_n::<u8>(2)?, 3);
    assert_eq!(reader.get_n::<u8>(2)?, 1);
    assert!(reader.get()?);
    assert_eq!(reader.get_n::<u8>(4)?, 9);
    assert_eq!(reader.position()?, 20);

    reader.skip_n(10)?;
    assert_eq!(reader.available()?, 2);
    assert!(reader.skip_n(3).is_err());
    Ok(())
}

#[test]
fn synchsafe_from_slice() -> io::Result<()> {
    let bytes = [0x00, 0x00, 0x02, 0x01];
    let mut reader = BsIoSliceReader::from_slice(&bytes);

    let mut size = 0u32;
    for _ in 0..4 {
        reader.skip_n(1)?;
        size = (size << 7) | reader.get_n::<u32>(7)?;
    }

    assert_eq!(size, 257);
    Ok(())
}
