//! Cursor reader/writer over NIfTI's fixed-layout binary records.
//!
//! NIfTI-1 files can be written in either byte order; the order is detected
//! from `sizeof_hdr` and then applies to the whole file.

use crate::error::{NiftiError, Result};

/// Byte order of a NIfTI file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (what every modern writer emits)
    Little,
    /// Big-endian
    Big,
}

/// A cursor-based reader over a byte slice.
pub struct NiftiBuffer<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> NiftiBuffer<'a> {
    /// Create a new reader over the given bytes.
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self { data, pos: 0, order }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Byte order used for multi-byte reads.
    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Remaining bytes from current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Set read position absolutely.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a sub-slice of `n` bytes, advancing the cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let b = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(b);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read an i8.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_ne_bytes(self.read_array::<1>()?))
    }

    /// Read a u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_array::<2>()?;
        Ok(match self.order {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        })
    }

    /// Read an i16.
    pub fn read_i16(&mut self) -> Result<i16> {
        let b = self.read_array::<2>()?;
        Ok(match self.order {
            ByteOrder::Little => i16::from_le_bytes(b),
            ByteOrder::Big => i16::from_be_bytes(b),
        })
    }

    /// Read a u32.
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_array::<4>()?;
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        })
    }

    /// Read an i32.
    pub fn read_i32(&mut self) -> Result<i32> {
        let b = self.read_array::<4>()?;
        Ok(match self.order {
            ByteOrder::Little => i32::from_le_bytes(b),
            ByteOrder::Big => i32::from_be_bytes(b),
        })
    }

    /// Read an f32.
    pub fn read_f32(&mut self) -> Result<f32> {
        let b = self.read_array::<4>()?;
        Ok(match self.order {
            ByteOrder::Little => f32::from_le_bytes(b),
            ByteOrder::Big => f32::from_be_bytes(b),
        })
    }

    /// Read an f64.
    pub fn read_f64(&mut self) -> Result<f64> {
        let b = self.read_array::<8>()?;
        Ok(match self.order {
            ByteOrder::Little => f64::from_le_bytes(b),
            ByteOrder::Big => f64::from_be_bytes(b),
        })
    }

    /// Read a fixed-width, NUL-padded ASCII field.
    pub fn read_fixed_str(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(n);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Read `N` i16 values.
    pub fn read_array_i16<const N: usize>(&mut self) -> Result<[i16; N]> {
        let mut out = [0i16; N];
        for v in &mut out {
            *v = self.read_i16()?;
        }
        Ok(out)
    }

    /// Read `N` f32 values.
    pub fn read_array_f32<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0f32; N];
        for v in &mut out {
            *v = self.read_f32()?;
        }
        Ok(out)
    }

    #[inline]
    fn ensure(&self, n: usize) -> Result<()> {
        if self.pos + n > self.data.len() {
            Err(NiftiError::BufferUnderflow { pos: self.pos, need: n, have: self.remaining() })
        } else {
            Ok(())
        }
    }
}

/// Little-endian append-only writer used for headers and payloads.
#[derive(Default)]
pub struct NiftiWriter {
    out: Vec<u8>,
}

impl NiftiWriter {
    /// Writer with preallocated capacity.
    pub fn with_capacity(n: usize) -> Self {
        Self { out: Vec::with_capacity(n) }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Whether nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Append raw bytes.
    pub fn put_bytes(&mut self, b: &[u8]) {
        self.out.extend_from_slice(b);
    }

    /// Append a byte.
    pub fn put_u8(&mut self, v: u8) {
        self.out.push(v);
    }

    /// Append an i16.
    pub fn put_i16(&mut self, v: i16) {
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    /// Append an i32.
    pub fn put_i32(&mut self, v: i32) {
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    /// Append an f32.
    pub fn put_f32(&mut self, v: f32) {
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    /// Append a NUL-padded fixed-width string, truncating if needed.
    pub fn put_fixed_str(&mut self, s: &str, n: usize) {
        let b = s.as_bytes();
        let take = b.len().min(n);
        self.out.extend_from_slice(&b[..take]);
        self.out.resize(self.out.len() + (n - take), 0);
    }

    /// Append `n` zero bytes.
    pub fn put_zeros(&mut self, n: usize) {
        self.out.resize(self.out.len() + n, 0);
    }

    /// Finish and return the bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_follow_byte_order() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        let mut le = NiftiBuffer::new(&bytes, ByteOrder::Little);
        let mut be = NiftiBuffer::new(&bytes, ByteOrder::Big);
        assert_eq!(le.read_u32().unwrap(), 0x0403_0201);
        assert_eq!(be.read_u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn underflow_reports_position() {
        let bytes = [0u8; 3];
        let mut b = NiftiBuffer::new(&bytes, ByteOrder::Little);
        b.skip(2).unwrap();
        match b.read_i16() {
            Err(NiftiError::BufferUnderflow { pos, need, have }) => {
                assert_eq!((pos, need, have), (2, 2, 1));
            }
            other => panic!("expected underflow, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn fixed_strings_stop_at_nul() {
        let mut w = NiftiWriter::default();
        w.put_fixed_str("n+1", 4);
        w.put_fixed_str("toolong", 3);
        let bytes = w.into_inner();
        assert_eq!(bytes, b"n+1\0too");
        let mut r = NiftiBuffer::new(&bytes, ByteOrder::Little);
        assert_eq!(r.read_fixed_str(4).unwrap(), "n+1");
        assert_eq!(r.read_fixed_str(3).unwrap(), "too");
    }
}
