//! Server-streaming response handle.
//!
//! A `ServerWriter` is created by the dispatcher for each streaming call and
//! moved into the handler, which may keep it long after dispatch returns.
//! Every write re-checks capacity against the channel buffer; failed writes
//! send nothing and leave the stream open.

use core::fmt;
use core::marker::PhantomData;

use log::{debug, warn};
use serde::Serialize;

use crate::error::{Error, OutputError};

use super::channel::RpcChannel;
use super::context::send_message;
use super::packet::{Packet, PacketType};
use super::status::Status;

pub struct ServerWriter<'o, Resp> {
    channel: Option<&'o dyn RpcChannel>,
    service_id: u32,
    method_id: u32,
    _response: PhantomData<fn(&Resp)>,
}

impl<'o, Resp> ServerWriter<'o, Resp> {
    pub fn new(channel: &'o dyn RpcChannel, service_id: u32, method_id: u32) -> Self {
        Self {
            channel: Some(channel),
            service_id,
            method_id,
            _response: PhantomData,
        }
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Channel this stream replies on, if still open.
    pub fn channel_id(&self) -> Option<u32> {
        self.channel.map(|c| c.id())
    }

    pub fn service_id(&self) -> u32 {
        self.service_id
    }

    pub fn method_id(&self) -> u32 {
        self.method_id
    }

    /// End the stream with `status`.  The writer is closed afterwards even
    /// if the end-of-stream envelope could not be sent.
    pub fn finish(&mut self, status: Status) -> Status {
        let Some(channel) = self.channel.take() else {
            return Status::FailedPrecondition;
        };
        let end = Packet::new(PacketType::ServerStreamEnd, channel.id(), self.service_id, self.method_id, &[])
            .with_status(status);
        match channel.send(&end) {
            Ok(_) => Status::Ok,
            Err(e) => send_failure_status(channel.id(), &e),
        }
    }
}

impl<Resp: Serialize> ServerWriter<'_, Resp> {
    /// Send one RESPONSE envelope with status OK.
    ///
    /// Returns `INTERNAL` without sending anything when the response does
    /// not fit the channel buffer, and `FAILED_PRECONDITION` on a closed
    /// writer.
    pub fn write(&self, response: &Resp) -> Status {
        let Some(channel) = self.channel else {
            return Status::FailedPrecondition;
        };
        match send_message(
            channel,
            PacketType::Response,
            self.service_id,
            self.method_id,
            response,
            Status::Ok,
        ) {
            Ok(_) => Status::Ok,
            Err(e) => send_failure_status(channel.id(), &e),
        }
    }
}

fn send_failure_status(channel_id: u32, e: &Error) -> Status {
    if e.is_buffer_too_small() {
        debug!("RPC[{}]: stream response does not fit", channel_id);
        return Status::Internal;
    }
    warn!("RPC[{}]: stream send failed: {}", channel_id, e);
    match e {
        Error::Output(OutputError::SinkFull | OutputError::Transport) => Status::Unavailable,
        _ => Status::Internal,
    }
}

/// A closed writer; every operation on it fails with `FAILED_PRECONDITION`.
impl<Resp> Default for ServerWriter<'_, Resp> {
    fn default() -> Self {
        Self {
            channel: None,
            service_id: 0,
            method_id: 0,
            _response: PhantomData,
        }
    }
}

impl<Resp> fmt::Debug for ServerWriter<'_, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerWriter")
            .field("channel_id", &self.channel_id())
            .field("service_id", &self.service_id)
            .field("method_id", &self.method_id)
            .finish()
    }
}
