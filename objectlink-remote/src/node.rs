//! Remote endpoint node.

use crate::registry::RemoteRegistry;
use crate::source::ObjectSource;
use objectlink_core::{BaseNode, LogLevel, MessageHandler};
use objectlink_protocol::{name, Message};
use serde_json::Value;
use std::sync::{Arc, Mutex, Weak};

/// Remote endpoint: dispatches inbound link, unlink, set-property and
/// invoke requests to the sources registered in its registry and carries
/// their signals and property changes back to the peer behind this node.
///
/// One remote node stands for one connected peer. Fanout to every peer
/// linked against a source goes through the registry's node snapshot:
/// each node in [`RemoteRegistry::get_remote_nodes`] publishes on its own
/// transport.
pub struct RemoteNode {
    base: BaseNode,
    registry: RemoteRegistry,
    node_id: u64,
    self_ref: Weak<RemoteNode>,
    /// Object ids linked through this node, in link order.
    linked: Mutex<Vec<String>>,
}

impl RemoteNode {
    /// Creates a node and registers it in the given registry.
    pub fn create(registry: RemoteRegistry) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| {
            let node_id = registry.attach_remote_node();
            Self {
                base: BaseNode::new(),
                registry,
                node_id,
                self_ref: self_ref.clone(),
                linked: Mutex::new(Vec::new()),
            }
        })
    }

    /// The id the registry assigned to this node.
    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// The registry this node is attached to.
    pub fn registry(&self) -> &RemoteRegistry {
        &self.registry
    }

    /// Installs the write callback used for outbound frames.
    pub fn on_write(&self, func: impl Fn(String) + Send + Sync + 'static) {
        self.base.on_write(func);
    }

    /// Installs the log callback.
    pub fn on_log(&self, func: impl Fn(LogLevel, String) + Send + Sync + 'static) {
        self.base.on_log(func);
    }

    /// Registers a source in this node's registry.
    pub fn add_source(&self, source: Arc<dyn ObjectSource>) {
        self.registry.add_source(source);
    }

    /// Deregisters a source from this node's registry.
    pub fn remove_source(&self, object_id: &str) {
        self.registry.remove_source(object_id);
    }

    /// Looks up a live source by object id.
    pub fn get_source(&self, object_id: &str) -> Option<Arc<dyn ObjectSource>> {
        self.registry.get_source(object_id)
    }

    /// Publishes a property change to the peer behind this node only.
    /// Sources wanting full fanout iterate the registry's node snapshot.
    pub fn notify_property_change(&self, property_id: &str, value: Value) {
        self.base.log(
            LogLevel::Debug,
            format!("notify property change: {property_id}"),
        );
        self.base
            .emit_write(Message::property_change(property_id, value));
    }

    /// Publishes a signal to the peer behind this node only.
    pub fn notify_signal(&self, signal_id: &str, args: Value) {
        self.base
            .log(LogLevel::Debug, format!("notify signal: {signal_id}"));
        self.base.emit_write(Message::signal(signal_id, args));
    }

    /// Synonym for [`RemoteNode::notify_property_change`].
    pub fn write_property_change(&self, property_id: &str, value: Value) {
        self.notify_property_change(property_id, value);
    }
}

impl MessageHandler for RemoteNode {
    fn base(&self) -> &BaseNode {
        &self.base
    }

    fn handle_link(&self, object_id: &str) {
        let Some(source) = self.registry.get_source(object_id) else {
            self.base
                .log(LogLevel::Warning, format!("link for unknown object: {object_id}"));
            return;
        };
        let Some(node) = self.self_ref.upgrade() else {
            return;
        };
        self.base
            .log(LogLevel::Info, format!("link object: {object_id}"));
        self.registry.link_remote_node(object_id, &node);
        {
            let mut linked = self.linked.lock().unwrap();
            if !linked.iter().any(|id| id == object_id) {
                linked.push(object_id.to_string());
            }
        }
        source.olink_linked(object_id, &node);
        let props = source.olink_collect_properties();
        self.base.emit_write(Message::init(object_id, props));
    }

    fn handle_unlink(&self, object_id: &str) {
        self.base
            .log(LogLevel::Info, format!("unlink object: {object_id}"));
        self.linked.lock().unwrap().retain(|id| id != object_id);
        if let Some(source) = self.registry.get_source(object_id) {
            source.olink_unlinked(object_id);
        }
        self.registry.unlink_remote_node(object_id, self.node_id);
    }

    fn handle_set_property(&self, property_id: &str, value: Value) {
        let object_id = name::object_id(property_id);
        let Some(source) = self.registry.get_source(object_id) else {
            self.base.log(
                LogLevel::Warning,
                format!("set property for unknown object: {object_id}"),
            );
            return;
        };
        source.olink_set_property(property_id, value);
    }

    fn handle_invoke(&self, request_id: u64, method_id: &str, args: Value) {
        let object_id = name::object_id(method_id);
        let Some(source) = self.registry.get_source(object_id) else {
            self.base.log(
                LogLevel::Warning,
                format!("invoke for unknown object: {object_id}"),
            );
            return;
        };
        self.base.log(
            LogLevel::Debug,
            format!("invoke: {method_id} (request {request_id})"),
        );
        let value = source.olink_invoke(method_id, args);
        self.base
            .emit_write(Message::invoke_reply(request_id, method_id, value));
    }
}

impl Drop for RemoteNode {
    /// Tells every source linked through this node that the link is gone
    /// and removes the node from all registry node sets.
    fn drop(&mut self) {
        let linked = std::mem::take(self.linked.get_mut().unwrap());
        for object_id in linked {
            if let Some(source) = self.registry.get_source(&object_id) {
                source.olink_unlinked(&object_id);
            }
            self.registry.unlink_remote_node(&object_id, self.node_id);
        }
        self.registry.detach_remote_node(self.node_id);
    }
}
