//! Forward-only little-endian reader over a byte stream

use std::io::Read;

use crate::error::DxmError;

/// Upper bound on speculative buffer reservation for a single block.
/// Larger blocks grow as bytes actually arrive, so a corrupt element count
/// fails with `TruncatedInput` instead of allocating the claimed size.
const MAX_RESERVE: usize = 1 << 20;

/// Sequential reader used by every decoding stage
///
/// There is no seeking: fields are consumed in storage order and the only
/// side effect of a read is advancing [`DxmReader::position`].
pub struct DxmReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> DxmReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read exactly `len` bytes, failing with `TruncatedInput` on a short stream
    pub fn read_bytes(&mut self, len: usize, field: &'static str) -> Result<Vec<u8>, DxmError> {
        let mut buf = Vec::with_capacity(len.min(MAX_RESERVE));
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;

        if buf.len() < len {
            return Err(DxmError::TruncatedInput {
                field,
                offset: self.position,
                expected: len,
                available: buf.len(),
            });
        }

        self.position += len as u64;
        Ok(buf)
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DxmError> {
        let mut buf = [0u8; N];
        let mut filled = 0;
        while filled < N {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < N {
            return Err(DxmError::TruncatedInput {
                field,
                offset: self.position,
                expected: N,
                available: filled,
            });
        }

        self.position += N as u64;
        Ok(buf)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, DxmError> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, DxmError> {
        Ok(u16::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, DxmError> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, DxmError> {
        Ok(u64::from_le_bytes(self.read_array(field)?))
    }

    /// Read `count` IEEE-754 single precision floats
    pub fn read_f32s(&mut self, count: u64, field: &'static str) -> Result<Vec<f32>, DxmError> {
        let bytes = self.read_elements(count, 4, field)?;
        Ok(le_f32s(&bytes))
    }

    pub fn read_u16s(&mut self, count: u64, field: &'static str) -> Result<Vec<u16>, DxmError> {
        let bytes = self.read_elements(count, 2, field)?;
        Ok(le_u16s(&bytes))
    }

    pub fn read_u32s(&mut self, count: u64, field: &'static str) -> Result<Vec<u32>, DxmError> {
        let bytes = self.read_elements(count, 4, field)?;
        Ok(le_u32s(&bytes))
    }

    /// Read `count` elements of `width` bytes as one raw byte run
    pub fn read_elements(
        &mut self,
        count: u64,
        width: u64,
        field: &'static str,
    ) -> Result<Vec<u8>, DxmError> {
        let len = count
            .checked_mul(width)
            .and_then(|len| usize::try_from(len).ok())
            .ok_or(DxmError::BlockTooLarge {
                field,
                elements: count,
            })?;
        self.read_bytes(len, field)
    }
}

/// Reinterpret a byte run as little-endian `f32` values
///
/// Trailing bytes that do not form a whole element are ignored.
pub(crate) fn le_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

pub(crate) fn le_u16s(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect()
}

pub(crate) fn le_u32s(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
