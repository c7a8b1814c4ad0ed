//! Tagged field primitives (protobuf-compatible subset).
//!
//! Only what the envelope needs: varints, little-endian fixed32 and
//! length-delimited bytes, plus skipping of unknown fields so newer peers
//! can add fields without breaking older ones.

use crate::error::PacketError;

/// Longest varint encoding of a `u64`.
pub const MAX_VARINT_SIZE: usize = 10;

/// Longest varint encoding of a `u32`.
pub const MAX_VARINT32_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    fn from_bits(bits: u8) -> Result<Self, PacketError> {
        match bits {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            5 => Ok(Self::Fixed32),
            _ => Err(PacketError::Malformed("unsupported wire type")),
        }
    }
}

/// Field key as it appears on the wire.
pub const fn key(field: u32, wire_type: WireType) -> u32 {
    (field << 3) | wire_type as u32
}

/// Bytes needed to varint-encode `value`.
pub const fn varint_len(value: u64) -> usize {
    let mut len = 1;
    let mut v = value >> 7;
    while v != 0 {
        len += 1;
        v >>= 7;
    }
    len
}

/// Cursor over a destination buffer.  Every write is bounds-checked and
/// fails with `BufferTooSmall` without writing a partial value.
pub struct WireWriter<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> WireWriter<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, len: usize) -> Result<&mut [u8], PacketError> {
        if len > self.remaining() {
            return Err(PacketError::BufferTooSmall);
        }
        let start = self.pos;
        self.pos += len;
        Ok(&mut self.buf[start..start + len])
    }

    pub fn write_varint(&mut self, mut value: u64) -> Result<(), PacketError> {
        let out = self.reserve(varint_len(value))?;
        for byte in out.iter_mut() {
            let continuation = if value >= 0x80 { 0x80 } else { 0 };
            *byte = (value as u8 & 0x7F) | continuation;
            value >>= 7;
        }
        Ok(())
    }

    pub fn write_key(&mut self, field: u32, wire_type: WireType) -> Result<(), PacketError> {
        self.write_varint(u64::from(key(field, wire_type)))
    }

    pub fn write_varint_field(&mut self, field: u32, value: u64) -> Result<(), PacketError> {
        self.write_key(field, WireType::Varint)?;
        self.write_varint(value)
    }

    pub fn write_fixed32_field(&mut self, field: u32, value: u32) -> Result<(), PacketError> {
        self.write_key(field, WireType::Fixed32)?;
        self.reserve(4)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn write_bytes_field(&mut self, field: u32, data: &[u8]) -> Result<(), PacketError> {
        self.write_key(field, WireType::LengthDelimited)?;
        self.write_varint(data.len() as u64)?;
        self.reserve(data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// End the cursor, handing back the bytes written so far and the whole
    /// buffer.  Used to encode a payload in place after the header.
    pub fn into_parts(self) -> (usize, &'b mut [u8]) {
        let pos = self.pos;
        (pos, self.buf)
    }
}

/// One decoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Fixed32(u32),
    Bytes(&'a [u8]),
}

/// Cursor over encoded fields.
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PacketError> {
        if len > self.data.len() - self.pos {
            return Err(PacketError::Malformed("truncated field"));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..start + len])
    }

    pub fn read_varint(&mut self) -> Result<u64, PacketError> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_SIZE {
            let byte = self.take(1)?[0];
            let bits = u64::from(byte & 0x7F);
            if i == MAX_VARINT_SIZE - 1 && bits > 1 {
                return Err(PacketError::Malformed("varint overflow"));
            }
            value |= bits << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(PacketError::Malformed("varint overflow"))
    }

    /// Next `(field number, value)`, or `None` at the end of input.
    pub fn next_field(&mut self) -> Result<Option<(u32, FieldValue<'a>)>, PacketError> {
        if self.pos == self.data.len() {
            return Ok(None);
        }
        let key = self.read_varint()?;
        let field = u32::try_from(key >> 3).map_err(|_| PacketError::Malformed("field number too large"))?;
        if field == 0 {
            return Err(PacketError::Malformed("field number zero"));
        }
        let value = match WireType::from_bits((key & 0x7) as u8)? {
            WireType::Varint => FieldValue::Varint(self.read_varint()?),
            WireType::Fixed64 => {
                let b = self.take(8)?;
                FieldValue::Fixed64(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            }
            WireType::Fixed32 => {
                let b = self.take(4)?;
                FieldValue::Fixed32(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            WireType::LengthDelimited => {
                let len = usize::try_from(self.read_varint()?)
                    .map_err(|_| PacketError::Malformed("length too large"))?;
                FieldValue::Bytes(self.take(len)?)
            }
        };
        Ok(Some((field, value)))
    }
}
