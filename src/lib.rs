//! HDLC-framed RPC for embedded links.
//!
//! Frames RPC envelopes onto any byte transport using caller-sized,
//! fixed-capacity buffers.  Every overflow and every malformed input is a
//! typed error; nothing allocates.
//!
//! The crate is `no_std`; unit tests run on the host with `std`.

#![cfg_attr(not(test), no_std)]
#![deny(unused_must_use)]

pub mod config;
pub mod error;
pub mod hdlc;
pub mod i2c;
pub mod rpc;
pub mod transport;

pub use config::LinkConfig;
pub use error::{Error, Result};
pub use hdlc::channel::HdlcChannelOutput;
pub use hdlc::decoder::FrameDecoder;
pub use hdlc::router::{LinkStats, RpcRouter};
pub use transport::Transport;
