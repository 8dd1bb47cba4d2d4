//! Shared error type across congabridge crates.

use thiserror::Error;

/// Coarse error classes (stable API).
///
/// The class decides what the caller does with the failure: framing errors
/// drop the connection, decode errors only fail the operation that hit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Truncated or oversized frame on the wire.
    Framing,
    /// Payload could not be decoded or encoded.
    Decode,
    /// Device rejected or mis-sequenced an exchange.
    Protocol,
    /// Socket level failure or no device connected.
    Transport,
    /// Invalid configuration.
    Config,
    /// Internal bridge error.
    Internal,
}

impl ErrorClass {
    /// String representation used in logs and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Framing => "FRAMING",
            ErrorClass::Decode => "DECODE",
            ErrorClass::Protocol => "PROTOCOL",
            ErrorClass::Transport => "TRANSPORT",
            ErrorClass::Config => "CONFIG",
            ErrorClass::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("truncated frame: declared {declared} bytes, {available} available")]
    TruncatedFrame { declared: usize, available: usize },
    #[error("invalid frame size: {0}")]
    InvalidFrameSize(usize),
    #[error("unexpected end of buffer: wanted {wanted} bytes, {remaining} remaining")]
    UnexpectedEof { wanted: usize, remaining: usize },
    #[error("invalid utf-8 string: {0}")]
    InvalidString(String),
    #[error("corrupt map payload: {0}")]
    CorruptMapPayload(String),
    #[error("unhandled map section 0x{0:x}")]
    UnhandledMapSection(u32),
    #[error("unsupported room enable info (size {0})")]
    UnsupportedRoomEnableInfo(u8),
    #[error("schema decode failed for {opname}: {reason}")]
    SchemaDecode { opname: &'static str, reason: String },
    #[error("schema validation: {0}")]
    SchemaValidation(String),
    #[error("device not connected")]
    NotConnected,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("io: {0}")]
    Io(String),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Map the error to its stable class.
    pub fn class(&self) -> ErrorClass {
        match self {
            BridgeError::TruncatedFrame { .. } | BridgeError::InvalidFrameSize(_) => {
                ErrorClass::Framing
            }
            BridgeError::UnexpectedEof { .. }
            | BridgeError::InvalidString(_)
            | BridgeError::CorruptMapPayload(_)
            | BridgeError::UnhandledMapSection(_)
            | BridgeError::UnsupportedRoomEnableInfo(_)
            | BridgeError::SchemaDecode { .. }
            | BridgeError::SchemaValidation(_) => ErrorClass::Decode,
            BridgeError::Timeout(_) => ErrorClass::Protocol,
            BridgeError::NotConnected | BridgeError::ConnectionClosed | BridgeError::Io(_) => {
                ErrorClass::Transport
            }
            BridgeError::BadConfig(_) | BridgeError::UnsupportedVersion => ErrorClass::Config,
            BridgeError::Internal(_) => ErrorClass::Internal,
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Io(e.to_string())
    }
}
