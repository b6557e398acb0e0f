//! Little-endian byte cursor and buffer writer.

use crate::error::{Error, Result};

/// Bounded read cursor. Reads past the end fail with
/// [`Error::UnexpectedEof`] and leave the position unchanged.
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

macro_rules! le_reads {
    ($($name:ident -> $ty:ty),* $(,)?) => {$(
        pub fn $name(&mut self) -> Result<$ty> {
            Ok(<$ty>::from_le_bytes(self.read_array()?))
        }
    )*};
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::at_offset(data, 0)
    }

    /// Cursor starting at an absolute offset into `data`.
    pub fn at_offset(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(drop)
    }

    /// Borrow the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let (data, start) = (self.data, self.pos);
        let slice = start
            .checked_add(n)
            .and_then(|end| data.get(start..end))
            .ok_or(Error::UnexpectedEof {
                offset: start,
                need: n,
                have: self.remaining(),
            })?;
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    le_reads! {
        read_i8 -> i8,
        read_u16 -> u16,
        read_i16 -> i16,
        read_u32 -> u32,
        read_i32 -> i32,
        read_f32 -> f32,
    }

    /// Read `count` consecutive `i32` fragment references.
    ///
    /// The whole list is bounds-checked before anything is allocated.
    pub fn read_reference_list(&mut self, count: usize) -> Result<Vec<i32>> {
        let raw = self.read_bytes(count.saturating_mul(4))?;
        Ok(raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}

/// Growable little-endian output buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

macro_rules! le_writes {
    ($($name:ident($ty:ty)),* $(,)?) => {$(
        pub fn $name(&mut self, v: $ty) {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
    )*};
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    le_writes! {
        write_i8(i8),
        write_u16(u16),
        write_i16(i16),
        write_u32(u32),
        write_i32(i32),
        write_f32(f32),
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
