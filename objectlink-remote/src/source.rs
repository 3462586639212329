//! Server-side source capability.

use crate::node::RemoteNode;
use serde_json::Value;
use std::sync::Arc;

/// A served object: the real implementation behind one object id.
///
/// A source registers in the [`RemoteRegistry`](crate::RemoteRegistry)
/// under its object name and answers requests forwarded by whichever
/// remote nodes are linked against it. Several nodes may serve the same
/// source concurrently, one per connected peer.
pub trait ObjectSource: Send + Sync {
    /// The object id this source implements.
    fn olink_object_name(&self) -> String;

    /// Handles a method invocation and returns its result value.
    fn olink_invoke(&self, method_id: &str, args: Value) -> Value;

    /// Applies a property-change request. The source is expected to answer
    /// with [`RemoteNode::notify_property_change`] when the value actually
    /// changed.
    fn olink_set_property(&self, property_id: &str, value: Value);

    /// A remote node linked against this object. The node handle may be
    /// kept (weakly) to publish signals and property changes later.
    fn olink_linked(&self, object_id: &str, node: &Arc<RemoteNode>);

    /// A remote node released its link.
    fn olink_unlinked(&self, object_id: &str);

    /// Snapshot of all properties, sent as the init message after a link.
    fn olink_collect_properties(&self) -> Value;
}
