//! Transport-agnostic RPC subsystem.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        RPC Stack                             │
//! │                                                              │
//! │  ┌────────┐   ┌──────────┐   ┌─────────┐   ┌──────────────┐  │
//! │  │ Server │──▶│ Service  │──▶│ Method  │──▶│   handler    │  │
//! │  │        │   │ (table)  │   │ (kind)  │   │              │  │
//! │  └────────┘   └──────────┘   └─────────┘   └──────┬───────┘  │
//! │      ▲                                            │          │
//! │      │ Packet::decode           ServerWriter /    ▼          │
//! │  ┌───┴────┐                   ┌──────────────────────────┐   │
//! │  │ bytes  │◀── ChannelOutput ◀│ Channel (RpcChannel)     │   │
//! │  └────────┘                   └──────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod channel;
pub mod context;
pub mod message;
pub mod method;
pub mod packet;
pub mod server;
pub mod service;
pub mod status;
pub mod wire;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{Channel, ChannelOutput, RpcChannel};
pub use context::ServerContext;
pub use method::{Method, MethodKind, ServerStreamingMethod, UnaryMethod};
pub use packet::{Packet, PacketType};
pub use server::Server;
pub use service::Service;
pub use status::Status;
pub use writer::ServerWriter;
