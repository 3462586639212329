//! # objectlink-client
//!
//! Client endpoint of the ObjectLink object-link RPC runtime.
//!
//! This crate provides:
//! - The [`ObjectSink`] capability implemented by client-side proxies
//! - [`ClientRegistry`], the shared directory binding object ids to sinks
//!   and their serving nodes
//! - [`ClientNode`], the stateful protocol endpoint that serializes
//!   outbound requests and routes inbound messages to sinks

pub mod node;
pub mod registry;
pub mod sink;

pub use node::{ClientNode, InvokeReplyArg, InvokeReplyFn};
pub use registry::ClientRegistry;
pub use sink::ObjectSink;
