use crate::core::error::{Error, ErrorKind, Result};

/// Variable byte encoding for integers (best for small integers)
pub struct VByteEncoder;

impl VByteEncoder {
    /// Values < 128 use 1 byte, < 16384 use 2 bytes, etc.
    pub fn encode_u64(output: &mut Vec<u8>, mut value: u64) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);  // Set continuation bit
            value >>= 7;
        }
        output.push(value as u8);  // Last byte without continuation bit
    }

    pub fn encode_u32(output: &mut Vec<u8>, value: u32) {
        Self::encode_u64(output, value as u64)
    }

    /// Decode single u64 value, returns (value, bytes_consumed)
    pub fn decode_u64(input: &[u8]) -> Result<(u64, usize)> {
        let mut value = 0u64;
        let mut shift = 0;
        let mut consumed = 0;

        for &byte in input {
            consumed += 1;
            value |= ((byte & 127) as u64) << shift;

            if byte & 128 == 0 {  // No continuation bit
                return Ok((value, consumed));
            }

            shift += 7;
            if shift > 63 {  // Max 10 bytes for u64
                return Err(Error::new(ErrorKind::Parse, "VByte overflow"));
            }
        }

        Err(Error::new(ErrorKind::Parse, "Incomplete VByte"))
    }

    pub fn decode_u32(input: &[u8]) -> Result<(u32, usize)> {
        let (value, consumed) = Self::decode_u64(input)?;
        let value = u32::try_from(value)
            .map_err(|_| Error::new(ErrorKind::Parse, "VByte value exceeds u32"))?;
        Ok((value, consumed))
    }
}

/// Cursor over a VByte-encoded buffer.
pub struct VByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        VByteReader { data, pos: 0 }
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let (value, consumed) = VByteEncoder::decode_u64(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let (value, consumed) = VByteEncoder::decode_u32(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}
