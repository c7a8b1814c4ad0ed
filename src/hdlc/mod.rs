//! HDLC-lite framing and the link built on it.
//!
//! ```text
//!  outbound:  RpcChannel ─▶ HdlcChannelOutput ─▶ encode_in_place ─▶ Transport
//!  inbound:   Transport ─▶ RpcRouter ─▶ FrameDecoder ─▶ Server::process_packet
//! ```

pub mod channel;
pub mod crc;
pub mod decoder;
pub mod frame;
pub mod router;
