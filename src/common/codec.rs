//! Little-endian fixed-width integer cursors over byte slices.
//!
//! Every on-disk structure (file header, node header, cells) is packed and
//! unpacked through these cursors. Reads and writes are bounds-checked and
//! fail with [`Error::ShortBuffer`] instead of panicking, so a truncated or
//! corrupt page surfaces as an error.

use crate::common::{Error, Result};

/// Read cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor to an absolute offset.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(Error::ShortBuffer {
                offset: pos,
                needed: 0,
                len: self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Bytes left between the cursor and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or_else(|| self.short(n))?;
        let bytes = self.buf.get(self.pos..end).ok_or_else(|| self.short(n))?;
        self.pos = end;
        Ok(bytes)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn short(&self, needed: usize) -> Error {
        Error::ShortBuffer {
            offset: self.pos,
            needed,
            len: self.buf.len(),
        }
    }
}

/// Write cursor over a borrowed mutable byte slice.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Start writing at the beginning of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Copy `bytes` at the cursor and advance past them.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self
            .pos
            .checked_add(bytes.len())
            .filter(|&end| end <= self.buf.len())
            .ok_or(Error::ShortBuffer {
                offset: self.pos,
                needed: bytes.len(),
                len: self.buf.len(),
            })?;
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put_bytes(&[value])
    }

    pub fn put_u16_le(&mut self, value: u16) -> Result<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_u32_le(&mut self, value: u32) -> Result<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    /// Zero the rest of the buffer and move the cursor to its end.
    pub fn zero_fill(&mut self) {
        self.buf[self.pos..].fill(0);
        self.pos = self.buf.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut buf = [0u8; 7];
        let mut writer = ByteWriter::new(&mut buf);
        writer.put_u8(0xAA).unwrap();
        writer.put_u16_le(0x0201).unwrap();
        writer.put_u32_le(0x06050403).unwrap();
        assert_eq!(writer.position(), 7);

        assert_eq!(buf, [0xAA, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn test_reader_sequence() {
        let buf = [0x0D, 0x0C, 0x00, 0x10, 0x00, 0x00, 0x00, b'h', b'i'];
        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_u8().unwrap(), 0x0D);
        assert_eq!(reader.read_u16_le().unwrap(), 12);
        assert_eq!(reader.read_u32_le().unwrap(), 16);
        assert_eq!(reader.read_bytes(2).unwrap(), b"hi");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_short_read_is_error() {
        let buf = [0x01, 0x02, 0x03];
        let mut reader = ByteReader::new(&buf);
        reader.read_u16_le().unwrap();

        match reader.read_u32_le() {
            Err(Error::ShortBuffer {
                offset,
                needed,
                len,
            }) => {
                assert_eq!(offset, 2);
                assert_eq!(needed, 4);
                assert_eq!(len, 3);
            }
            other => panic!("expected ShortBuffer, got {:?}", other),
        }
        // A failed read does not move the cursor
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_reader_seek() {
        let buf = [0u8, 0, 0, 0x2A];
        let mut reader = ByteReader::new(&buf);
        reader.seek(3).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0x2A);
        assert!(reader.seek(5).is_err());
        reader.seek(4).unwrap();
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_writer_overflow_is_error() {
        let mut buf = [0u8; 3];
        let mut writer = ByteWriter::new(&mut buf);
        writer.put_u16_le(1).unwrap();
        assert!(writer.put_u16_le(2).is_err());
        assert_eq!(writer.position(), 2);
    }

    #[test]
    fn test_zero_fill() {
        let mut buf = [0xFFu8; 6];
        let mut writer = ByteWriter::new(&mut buf);
        writer.put_u8(7).unwrap();
        writer.zero_fill();
        assert_eq!(writer.position(), 6);
        assert_eq!(buf, [7, 0, 0, 0, 0, 0]);
    }
}
