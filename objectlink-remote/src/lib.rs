//! # objectlink-remote
//!
//! Remote (server) endpoint of the ObjectLink object-link RPC runtime.
//!
//! This crate provides:
//! - The [`ObjectSource`] capability implemented by served objects
//! - [`RemoteRegistry`], the shared directory binding object ids to
//!   sources and the set of nodes currently linked against them
//! - [`RemoteNode`], the protocol endpoint that dispatches inbound
//!   requests to sources and publishes their signals and property changes

pub mod node;
pub mod registry;
pub mod source;

pub use node::RemoteNode;
pub use registry::RemoteRegistry;
pub use source::ObjectSource;
