//! RPC envelope and its wire encoding (protocol version 1).
//!
//! ```text
//! field  name        wire type          always emitted
//!   1    type        varint             yes
//!   2    channel_id  varint             yes
//!   3    service_id  fixed32 LE         yes
//!   4    method_id   fixed32 LE         yes
//!   6    status      varint             yes
//!   5    payload     length-delimited   yes, last
//! ```
//!
//! Every field is written even when it holds its default value, so the
//! size of an envelope depends only on its channel id and payload length.
//! The payload goes last so it can be serialized directly into the output
//! buffer behind the header.  Decoding accepts any field order, skips
//! unknown fields and defaults everything except the two ids.

use crate::error::PacketError;

use super::status::Status;
use super::wire::{self, FieldValue, WireReader, WireType, WireWriter};

const TYPE_FIELD: u32 = 1;
const CHANNEL_ID_FIELD: u32 = 2;
const SERVICE_ID_FIELD: u32 = 3;
const METHOD_ID_FIELD: u32 = 4;
const PAYLOAD_FIELD: u32 = 5;
const STATUS_FIELD: u32 = 6;

/// Key + fixed32 value.
const FIXED32_FIELD_SIZE: usize = 1 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum PacketType {
    /// Client → server call.
    #[default]
    Request = 0,
    /// Server → client reply, or one message of a server stream.
    Response = 1,
    /// Server → client: the stream is over; `status` is final.
    ServerStreamEnd = 2,
    /// Server → client: the call failed; carries no payload.
    Error = 3,
}

impl PacketType {
    fn from_wire(value: u64) -> Result<Self, PacketError> {
        match value {
            0 => Ok(Self::Request),
            1 => Ok(Self::Response),
            2 => Ok(Self::ServerStreamEnd),
            3 => Ok(Self::Error),
            _ => Err(PacketError::Malformed("unknown packet type")),
        }
    }
}

/// One RPC envelope.  The payload borrows its source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub packet_type: PacketType,
    pub channel_id: u32,
    pub service_id: u32,
    pub method_id: u32,
    pub payload: &'a [u8],
    pub status: Status,
}

impl<'a> Packet<'a> {
    pub fn new(
        packet_type: PacketType,
        channel_id: u32,
        service_id: u32,
        method_id: u32,
        payload: &'a [u8],
    ) -> Self {
        Self {
            packet_type,
            channel_id,
            service_id,
            method_id,
            payload,
            status: Status::Ok,
        }
    }

    /// A payload-less error reply.  Always fits wherever an empty response
    /// for the same call would fit.
    pub fn error(channel_id: u32, service_id: u32, method_id: u32, status: Status) -> Packet<'static> {
        Packet {
            packet_type: PacketType::Error,
            channel_id,
            service_id,
            method_id,
            payload: &[],
            status,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Encoded size of this envelope with an empty payload.
    ///
    /// A lower bound on the size of any envelope with the same header, used
    /// to reject hopeless sends before serializing anything.
    pub fn min_encoded_size(&self) -> usize {
        2 + (1 + wire::varint_len(u64::from(self.channel_id)))
            + 2 * FIXED32_FIELD_SIZE
            + (1 + wire::varint_len(u64::from(self.status.code())))
            + 2
    }

    /// Exact encoded size including the current payload.
    pub fn encoded_size(&self) -> usize {
        self.min_encoded_size() - 1
            + wire::varint_len(self.payload.len() as u64)
            + self.payload.len()
    }

    /// Serialize into `buf`, returning the encoded length.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, PacketError> {
        let payload = self.payload;
        self.encode_with(buf, |dst: &mut [u8]| {
            let dst = dst.get_mut(..payload.len()).ok_or(PacketError::BufferTooSmall)?;
            dst.copy_from_slice(payload);
            Ok(payload.len())
        })
    }

    /// Serialize the header, then let `write_payload` fill the payload
    /// directly into the remaining space.  `self.payload` is ignored.
    ///
    /// `write_payload` receives everything after the header and returns the
    /// number of bytes it produced.
    pub fn encode_with<E, F>(&self, buf: &mut [u8], write_payload: F) -> Result<usize, E>
    where
        E: From<PacketError>,
        F: FnOnce(&mut [u8]) -> Result<usize, E>,
    {
        let mut w = WireWriter::new(buf);
        w.write_varint_field(TYPE_FIELD, self.packet_type as u64)?;
        w.write_varint_field(CHANNEL_ID_FIELD, u64::from(self.channel_id))?;
        w.write_fixed32_field(SERVICE_ID_FIELD, self.service_id)?;
        w.write_fixed32_field(METHOD_ID_FIELD, self.method_id)?;
        w.write_varint_field(STATUS_FIELD, u64::from(self.status.code()))?;
        let (header_len, buf) = w.into_parts();

        // Optimistically assume a one-byte length prefix; shift the payload
        // right afterwards if it turned out longer.
        let start = header_len + 2;
        let region = buf.get_mut(start..).ok_or(PacketError::BufferTooSmall)?;
        let len = write_payload(region)?;

        let len_size = wire::varint_len(len as u64);
        let total = header_len + 1 + len_size + len;
        if total > buf.len() {
            return Err(PacketError::BufferTooSmall.into());
        }
        if len_size > 1 {
            buf.copy_within(start..start + len, start + len_size - 1);
        }

        let mut w = WireWriter::new(&mut buf[header_len..]);
        w.write_key(PAYLOAD_FIELD, WireType::LengthDelimited)?;
        w.write_varint(len as u64)?;
        Ok(total)
    }

    /// Parse an envelope.  Service and method ids are required.
    pub fn decode(data: &'a [u8]) -> Result<Self, PacketError> {
        let mut packet_type = PacketType::Request;
        let mut channel_id = 0;
        let mut service_id = None;
        let mut method_id = None;
        let mut payload: &'a [u8] = &[];
        let mut status = Status::Ok;

        let mut r = WireReader::new(data);
        while let Some((field, value)) = r.next_field()? {
            match (field, value) {
                (TYPE_FIELD, FieldValue::Varint(v)) => packet_type = PacketType::from_wire(v)?,
                (CHANNEL_ID_FIELD, FieldValue::Varint(v)) => {
                    channel_id = u32::try_from(v).map_err(|_| PacketError::Malformed("channel id overflow"))?;
                }
                (SERVICE_ID_FIELD, FieldValue::Fixed32(v)) => service_id = Some(v),
                (METHOD_ID_FIELD, FieldValue::Fixed32(v)) => method_id = Some(v),
                (PAYLOAD_FIELD, FieldValue::Bytes(b)) => payload = b,
                (STATUS_FIELD, FieldValue::Varint(v)) => {
                    status = u32::try_from(v).map_or(Status::Unknown, Status::from_code);
                }
                (TYPE_FIELD..=STATUS_FIELD, _) => {
                    return Err(PacketError::Malformed("wrong wire type for field"));
                }
                _ => {} // unknown field, skipped
            }
        }

        Ok(Self {
            packet_type,
            channel_id,
            service_id: service_id.ok_or(PacketError::Malformed("missing service id"))?,
            method_id: method_id.ok_or(PacketError::Malformed("missing method id"))?,
            payload,
            status,
        })
    }
}
