use super::name::decompress;
use super::WireError;

/// Read position over an immutable byte buffer.
///
/// Every read checks bounds first and leaves the position untouched on
/// failure. Names are decompressed against the whole buffer, so the cursor
/// must be created over the message (or payload) that pointers refer to.
#[derive(Debug, Clone)]
pub struct WireCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Result<Self, WireError> {
        let mut cursor = Self::new(buf);
        cursor.set_position(pos)?;
        Ok(cursor)
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) -> Result<(), WireError> {
        if pos > self.buf.len() {
            return Err(WireError::Truncated {
                offset: self.pos,
                wanted: pos.saturating_sub(self.pos),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(WireError::Truncated {
                offset: self.pos,
                wanted: n,
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), WireError> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, WireError> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, WireError> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, WireError> {
        self.read_array().map(u32::from_be_bytes)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, WireError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Decodes a possibly compressed name at the current position and
    /// advances past the bytes it occupies here (up to and including the
    /// first pointer).
    pub fn read_name(&mut self) -> Result<String, WireError> {
        let (name, consumed) = decompress(self.buf, self.pos)?;
        self.skip(consumed)?;
        Ok(name)
    }
}
