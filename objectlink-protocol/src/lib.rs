//! # objectlink-protocol
//!
//! Wire protocol for the ObjectLink object-link RPC runtime.
//!
//! This crate provides:
//! - Dot-separated member identifier utilities
//! - The tagged-tuple message type with one builder per message kind
//! - JSON text serialization via [`MessageConverter`]
//! - Protocol error types

pub mod codec;
pub mod error;
pub mod message;
pub mod name;

pub use codec::{MessageConverter, MessageFormat};
pub use error::ProtocolError;
pub use message::{Message, MsgType};
