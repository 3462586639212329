//! Client-side sink capability.

use crate::node::ClientNode;
use serde_json::Value;
use std::sync::Arc;

/// A client-side proxy object fed by a client node.
///
/// A sink registers in the [`ClientRegistry`](crate::ClientRegistry) under
/// its object name and receives everything the linked source publishes.
/// The registry keeps only a weak handle, so a sink may be dropped while
/// still registered; the runtime then drops messages addressed to it.
pub trait ObjectSink: Send + Sync {
    /// The object id this sink stands in for.
    fn olink_object_name(&self) -> String;

    /// Initial property state, delivered once the peer accepts the link.
    /// The node handle may be kept (weakly) to issue requests later.
    fn olink_on_init(&self, object_id: &str, props: Value, node: &Arc<ClientNode>);

    /// A property on the source changed.
    fn olink_on_property_changed(&self, property_id: &str, value: Value);

    /// The source raised a signal.
    fn olink_on_signal(&self, signal_id: &str, args: Value);

    /// The node serving this sink unlinked it, whether explicitly or
    /// during node teardown.
    fn olink_on_release(&self);
}
