//! Per-call context handed to method handlers.

use serde::Serialize;

use crate::error::{Error, PacketError};

use super::channel::RpcChannel;
use super::message;
use super::packet::{Packet, PacketType};
use super::status::Status;

/// Identifies one in-flight call and the channel its replies go to.
pub struct ServerContext<'o> {
    channel: &'o dyn RpcChannel,
    service_id: u32,
    method_id: u32,
}

impl<'o> ServerContext<'o> {
    pub fn new(channel: &'o dyn RpcChannel, service_id: u32, method_id: u32) -> Self {
        Self {
            channel,
            service_id,
            method_id,
        }
    }

    pub fn channel_id(&self) -> u32 {
        self.channel.id()
    }

    pub fn service_id(&self) -> u32 {
        self.service_id
    }

    pub fn method_id(&self) -> u32 {
        self.method_id
    }

    pub(crate) fn channel(&self) -> &'o dyn RpcChannel {
        self.channel
    }

    /// Send a payload-less ERROR envelope for this call.
    pub(crate) fn send_error(&self, status: Status) -> Result<usize, Error> {
        let packet = Packet::error(self.channel.id(), self.service_id, self.method_id, status);
        self.channel.send(&packet)
    }

    /// Send a RESPONSE envelope carrying `response` for this call.
    pub(crate) fn send_response<T: Serialize>(&self, response: &T, status: Status) -> Result<usize, Error> {
        send_message(
            self.channel,
            PacketType::Response,
            self.service_id,
            self.method_id,
            response,
            status,
        )
    }
}

/// Encode `msg` straight into the channel's buffer behind an envelope header.
///
/// Envelopes whose empty-payload size already exceeds the channel buffer are
/// rejected before anything is acquired.
pub(crate) fn send_message<T: Serialize>(
    channel: &dyn RpcChannel,
    packet_type: PacketType,
    service_id: u32,
    method_id: u32,
    msg: &T,
    status: Status,
) -> Result<usize, Error> {
    let header = Packet::new(packet_type, channel.id(), service_id, method_id, &[]).with_status(status);
    if header.min_encoded_size() > channel.buffer_size() {
        return Err(PacketError::BufferTooSmall.into());
    }
    channel.send_with(&header, &mut |dst: &mut [u8]| Ok(message::encode(msg, dst)?))
}
