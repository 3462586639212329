//! Converter between in-memory messages and wire text frames.

use crate::error::ProtocolError;
use crate::message::Message;
use std::fmt;

/// Wire formats the converter can be parameterized with.
///
/// Only [`MessageFormat::Json`] is implemented; the remaining formats are
/// reserved and rejected with [`ProtocolError::UnsupportedFormat`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageFormat {
    #[default]
    Json,
    Bson,
    MsgPack,
    Cbor,
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageFormat::Json => write!(f, "JSON"),
            MessageFormat::Bson => write!(f, "BSON"),
            MessageFormat::MsgPack => write!(f, "MessagePack"),
            MessageFormat::Cbor => write!(f, "CBOR"),
        }
    }
}

/// Stateless converter between [`Message`] values and text frames.
///
/// The converter is pure: no shared state, no I/O. Parse failures are
/// returned to the caller, which decides whether to drop the frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageConverter {
    format: MessageFormat,
}

impl MessageConverter {
    pub fn new(format: MessageFormat) -> Self {
        Self { format }
    }

    /// Returns the configured wire format.
    pub fn format(&self) -> MessageFormat {
        self.format
    }

    /// Serializes a message into a wire frame.
    pub fn to_string(&self, message: &Message) -> Result<String, ProtocolError> {
        match self.format {
            MessageFormat::Json => Ok(serde_json::to_string(message)?),
            other => Err(ProtocolError::UnsupportedFormat(other)),
        }
    }

    /// Parses a wire frame back into a message.
    pub fn from_string(&self, raw: &str) -> Result<Message, ProtocolError> {
        match self.format {
            MessageFormat::Json => Ok(serde_json::from_str(raw)?),
            other => Err(ProtocolError::UnsupportedFormat(other)),
        }
    }
}
