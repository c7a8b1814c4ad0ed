//! Unified error types for the link stack.
//!
//! Each layer has its own small `Copy` enum, and every one of them converts
//! into the crate-wide [`Error`] so callers that route bytes end to end can
//! funnel failures through one type.  Nothing here allocates.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// HDLC framing failed (capacity or corruption).
    Frame(FrameError),
    /// RPC envelope could not be encoded or decoded.
    Packet(PacketError),
    /// Request or response payload codec failed.
    Message(MessageError),
    /// The channel output rejected the send.
    Output(OutputError),
    /// A bus transaction failed.
    Bus(BusError),
    /// The byte transport reported a read failure.
    Transport,
    /// A packet named a channel id the server does not know.
    UnknownChannel(u32),
    /// Configuration is invalid.
    Config(&'static str),
}

impl Error {
    /// Whether this failure means "the encoded bytes did not fit".
    ///
    /// The unary dispatcher only substitutes an INTERNAL error envelope for
    /// this class of failure; sink errors are logged and dropped.
    pub fn is_buffer_too_small(&self) -> bool {
        matches!(
            self,
            Self::Frame(FrameError::BufferTooSmall)
                | Self::Packet(PacketError::BufferTooSmall)
                | Self::Message(MessageError::BufferTooSmall)
                | Self::Output(OutputError::TooLarge)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Packet(e) => write!(f, "packet: {e}"),
            Self::Message(e) => write!(f, "message: {e}"),
            Self::Output(e) => write!(f, "output: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Transport => write!(f, "transport read failed"),
            Self::UnknownChannel(id) => write!(f, "unknown channel {id}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The destination region cannot hold the result.
    BufferTooSmall,
    /// The received bytes are not a valid frame.
    Corrupt(Corruption),
}

/// Why a received frame was rejected.  None of these produce partial output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Frame does not start and end with a flag byte.
    MissingDelimiter,
    /// Body shorter than address + control + checksum.
    TooShort,
    /// Escape marker at the end of the body or followed by a byte that
    /// never results from escaping.
    InvalidEscape,
    /// Recomputed CRC-32 differs from the trailing checksum.
    ChecksumMismatch,
}

impl FrameError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Corrupt(c) => write!(f, "corrupt frame ({c})"),
        }
    }
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDelimiter => write!(f, "missing flag delimiter"),
            Self::TooShort => write!(f, "body too short"),
            Self::InvalidEscape => write!(f, "invalid escape sequence"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

impl From<Corruption> for FrameError {
    fn from(c: Corruption) -> Self {
        Self::Corrupt(c)
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Packet errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    /// The envelope does not fit the destination buffer.
    BufferTooSmall,
    /// The source bytes are not a valid envelope.
    Malformed(&'static str),
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Malformed(why) => write!(f, "malformed packet: {why}"),
        }
    }
}

impl From<PacketError> for Error {
    fn from(e: PacketError) -> Self {
        Self::Packet(e)
    }
}

// ---------------------------------------------------------------------------
// Message (payload codec) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageError {
    /// Serialized message does not fit the payload region.
    BufferTooSmall,
    /// The message could not be serialized.
    Encode,
    /// Payload does not conform to the expected schema.
    Decode,
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Encode => write!(f, "encode failed"),
            Self::Decode => write!(f, "payload does not match schema"),
        }
    }
}

impl From<MessageError> for Error {
    fn from(e: MessageError) -> Self {
        Self::Message(e)
    }
}

// ---------------------------------------------------------------------------
// Channel output errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// The scratch buffer is already acquired.  Contract violation.
    BufferInUse,
    /// Release or discard without a matching acquire.  Contract violation.
    NotAcquired,
    /// Released length exceeds the payload region.
    TooLarge,
    /// The byte sink has no room for the whole frame.
    SinkFull,
    /// The byte sink reported an error or a short write.
    Transport,
    /// Framing the payload failed.
    Frame(FrameError),
}

impl OutputError {
    /// Misuse of the acquire/release protocol, as opposed to a runtime
    /// condition of the link.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::BufferInUse | Self::NotAcquired)
    }
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferInUse => write!(f, "buffer already acquired"),
            Self::NotAcquired => write!(f, "buffer not acquired"),
            Self::TooLarge => write!(f, "payload exceeds buffer"),
            Self::SinkFull => write!(f, "sink full"),
            Self::Transport => write!(f, "transport write failed"),
            Self::Frame(e) => write!(f, "framing failed: {e}"),
        }
    }
}

impl From<FrameError> for OutputError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<OutputError> for Error {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Transaction attempted while the bus is disabled.
    Disabled,
    /// Address out of range for the bus addressing mode.
    InvalidAddress,
    /// Target did not acknowledge its address or a data byte.
    NoAcknowledge,
    /// Another controller won arbitration.
    ArbitrationLoss,
    /// Misplaced start/stop or other bus-level fault.
    Bus,
    /// Receive data was overwritten before it was read.
    Overrun,
    /// Driver-specific failure.
    Other,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "bus disabled"),
            Self::InvalidAddress => write!(f, "invalid address"),
            Self::NoAcknowledge => write!(f, "no acknowledge"),
            Self::ArbitrationLoss => write!(f, "arbitration lost"),
            Self::Bus => write!(f, "bus error"),
            Self::Overrun => write!(f, "overrun"),
            Self::Other => write!(f, "driver error"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
