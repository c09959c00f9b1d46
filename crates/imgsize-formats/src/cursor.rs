use byteorder::{BigEndian, ReadBytesExt};
use imgsize_common::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Seekable byte source every walker reads through.
///
/// Short reads are `TruncatedInput`, never a partially filled buffer.
pub struct ByteCursor<R> {
    inner: R,
}

impl<R: Read + Seek> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read exactly `n` bytes.
    ///
    /// The buffer grows with the data actually present, so a bogus length
    /// field cannot force a huge allocation up front.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(n.min(64 * 1024));
        (&mut self.inner).take(n as u64).read_to_end(&mut buf)?;
        if buf.len() < n {
            return Err(Error::TruncatedInput {
                wanted: n - buf.len(),
            });
        }
        Ok(buf)
    }

    /// Read up to `limit` bytes, stopping early at end of stream
    pub fn read_up_to(&mut self, limit: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(limit.min(64 * 1024));
        (&mut self.inner).take(limit as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| Error::from_read(e, N))?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(|e| Error::from_read(e, 1))
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.inner
            .read_u16::<BigEndian>()
            .map_err(|e| Error::from_read(e, 2))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.inner
            .read_u32::<BigEndian>()
            .map_err(|e| Error::from_read(e, 4))
    }

    /// Jump to an absolute offset from the start of the stream
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Move relative to the current position
    pub fn skip(&mut self, delta: i64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(delta))?;
        Ok(())
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.seek_to(0)
    }
}
