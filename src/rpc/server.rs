//! RPC server: routes decoded REQUEST packets to method handlers.

use log::{debug, warn};

use crate::error::{Error, Result};

use super::channel::RpcChannel;
use super::context::ServerContext;
use super::method::Method;
use super::packet::{Packet, PacketType};
use super::service::Service;
use super::status::Status;

pub struct Server<'o> {
    channels: &'o [&'o dyn RpcChannel],
    services: &'o [Service<'o>],
}

impl<'o> Server<'o> {
    pub const fn new(channels: &'o [&'o dyn RpcChannel], services: &'o [Service<'o>]) -> Self {
        Self { channels, services }
    }

    pub fn channel(&self, id: u32) -> Option<&'o dyn RpcChannel> {
        self.channels.iter().copied().find(|c| c.id() == id)
    }

    pub fn service(&self, id: u32) -> Option<&'o Service<'o>> {
        self.services.iter().find(|s| s.id() == id)
    }

    fn method(&self, service_id: u32, method_id: u32) -> Option<&'o Method<'o>> {
        self.service(service_id)?.method(method_id)
    }

    /// Handle one encoded packet.
    ///
    /// Replies (including NOT_FOUND for unknown services or methods) go out
    /// on the packet's channel.  Only failures that leave no channel to
    /// reply on are returned as errors.
    pub fn process_packet(&self, data: &[u8]) -> Result<()> {
        let packet = Packet::decode(data).inspect_err(|e| warn!("RPC: dropping packet: {}", e))?;

        if packet.packet_type != PacketType::Request {
            warn!(
                "RPC[{}]: ignoring {:?} packet sent to server",
                packet.channel_id, packet.packet_type
            );
            return Ok(());
        }

        let Some(channel) = self.channel(packet.channel_id) else {
            warn!("RPC[{}]: unknown channel", packet.channel_id);
            return Err(Error::UnknownChannel(packet.channel_id));
        };

        let Some(method) = self.method(packet.service_id, packet.method_id) else {
            debug!(
                "RPC[{}]: no method {:08x}/{:08x}",
                packet.channel_id, packet.service_id, packet.method_id
            );
            let reply = Packet::error(channel.id(), packet.service_id, packet.method_id, Status::NotFound);
            channel.send(&reply)?;
            return Ok(());
        };

        let ctx = ServerContext::new(channel, packet.service_id, packet.method_id);
        method.invoke(&ctx, &packet);
        Ok(())
    }
}
