//! Request/response payload codec.
//!
//! Messages are plain serde types encoded with postcard, the same pairing
//! the firmware uses for persisted configuration.  Decoding is strict: the
//! payload must be consumed exactly.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::MessageError;

/// Serialize `msg` into the front of `buf`, returning the encoded length.
pub fn encode<T: Serialize>(msg: &T, buf: &mut [u8]) -> Result<usize, MessageError> {
    match postcard::to_slice(msg, buf) {
        Ok(used) => Ok(used.len()),
        Err(postcard::Error::SerializeBufferFull) => Err(MessageError::BufferTooSmall),
        Err(_) => Err(MessageError::Encode),
    }
}

/// Deserialize a complete payload.  Trailing bytes are a decode failure.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, MessageError> {
    let (msg, rest) = postcard::take_from_bytes(bytes).map_err(|_| MessageError::Decode)?;
    if !rest.is_empty() {
        return Err(MessageError::Decode);
    }
    Ok(msg)
}
