//! # objectlink-core
//!
//! Node plumbing shared by the ObjectLink client and remote endpoints.
//!
//! This crate provides:
//! - The node log channel (`LogLevel` and callback types)
//! - `BaseNode`: write/log callback slots and outbound frame emission
//! - `MessageHandler`: inbound frame decoding and per-kind dispatch

pub mod node;
pub mod types;

pub use node::{BaseNode, MessageHandler};
pub use types::{LogFn, LogLevel, WriteMessageFn};
