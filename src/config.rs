//! Link configuration parameters
//!
//! Everything a board needs to bring up one HDLC RPC link.  Values can be
//! persisted with postcard and loaded at boot.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for one HDLC-framed RPC channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// HDLC address stamped on outbound frames and accepted on inbound ones
    pub hdlc_address: u8,
    /// RPC channel id carried in every envelope (0 is reserved)
    pub channel_id: u32,
    /// Diagnostic name of the channel output
    pub channel_name: String<32>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        let mut channel_name = String::new();
        // "hdlc" always fits a 32-byte name
        let _ = channel_name.push_str("hdlc");
        Self {
            hdlc_address: 1,
            channel_id: 1,
            channel_name,
        }
    }
}

impl LinkConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.channel_id == 0 {
            return Err(Error::Config("channel id 0 is reserved"));
        }
        if self.channel_name.is_empty() {
            return Err(Error::Config("channel name must not be empty"));
        }
        Ok(())
    }
}
