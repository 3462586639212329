//! Client endpoint node.

use crate::registry::ClientRegistry;
use objectlink_core::{BaseNode, LogLevel, MessageHandler};
use objectlink_protocol::{name, Message, MsgType};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Payload delivered to an invocation reply callback.
#[derive(Debug, Clone)]
pub struct InvokeReplyArg {
    /// The method id echoed by the peer. Passed through verbatim; it is
    /// not validated against the original request.
    pub method_id: String,
    pub value: Value,
}

/// Callback fired once when the reply for an invocation arrives.
pub type InvokeReplyFn = Box<dyn FnOnce(InvokeReplyArg) + Send>;

/// Client endpoint: serializes outbound requests, correlates replies by
/// request id and routes inbound messages to the sinks registered for the
/// addressed objects.
///
/// A node registers itself in the registry on creation and detaches on
/// drop; never attach or detach it manually. Use [`ClientNode::link_remote`]
/// to bind an object to this node; the registry's node binding is managed
/// by the node itself during link and unlink.
///
/// All methods run inline on the calling thread. A transport feeds inbound
/// frames through [`MessageHandler::handle_message`] and receives outbound
/// frames through the callback installed with [`ClientNode::on_write`].
pub struct ClientNode {
    base: BaseNode,
    registry: ClientRegistry,
    node_id: u64,
    self_ref: Weak<ClientNode>,
    next_request_id: AtomicU64,
    pending: Mutex<HashMap<u64, InvokeReplyFn>>,
    /// Object ids linked through this node, in establishment order.
    linked: Mutex<Vec<String>>,
}

impl ClientNode {
    /// Creates a node and registers it in the given registry.
    pub fn create(registry: ClientRegistry) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| {
            let node_id = registry.attach_client_node();
            Self {
                base: BaseNode::new(),
                registry,
                node_id,
                self_ref: self_ref.clone(),
                next_request_id: AtomicU64::new(0),
                pending: Mutex::new(HashMap::new()),
                linked: Mutex::new(Vec::new()),
            }
        })
    }

    /// The id the registry assigned to this node.
    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// The registry this node is attached to.
    pub fn registry(&self) -> &ClientRegistry {
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

    /// Requests a link to a remote object and binds this node as its
    /// handler. Link requests are stateless on the wire: every call emits
    /// a frame, whatever was linked before.
    pub fn link_remote(&self, object_id: &str) {
        self.base
            .log(LogLevel::Info, format!("link remote: {object_id}"));
        if let Some(node) = self.self_ref.upgrade() {
            self.registry.set_node(object_id, &node);
        }
        {
            let mut linked = self.linked.lock().unwrap();
            if !linked.iter().any(|id| id == object_id) {
                linked.push(object_id.to_string());
            }
        }
        self.base.emit_write(Message::link(object_id));
    }

    /// Emits an unlink request, tells a still-live sink it is released and
    /// clears the registry's node binding. Stateless like linking: the
    /// frame and the release hook fire on every call.
    pub fn unlink_remote(&self, object_id: &str) {
        self.base
            .log(LogLevel::Info, format!("unlink remote: {object_id}"));
        self.linked.lock().unwrap().retain(|id| id != object_id);
        self.base.emit_write(Message::unlink(object_id));
        if let Some(sink) = self.registry.get_sink(object_id) {
            sink.olink_on_release();
        }
        self.registry.unset_node(object_id);
    }

    /// Invokes a remote method. With a reply callback the invocation is
    /// recorded until the matching reply arrives; without one it is
    /// fire-and-forget.
    pub fn invoke_remote(&self, method_id: &str, args: Value, reply: Option<InvokeReplyFn>) {
        let request_id = self.next_request_id();
        self.base.log(
            LogLevel::Debug,
            format!("invoke remote: {method_id} (request {request_id})"),
        );
        if let Some(reply) = reply {
            self.pending.lock().unwrap().insert(request_id, reply);
        }
        self.base
            .emit_write(Message::invoke(request_id, method_id, args));
    }

    /// Requests a property change on the source. No client-side state is
    /// kept; the effective value comes back as a property-change message.
    pub fn set_remote_property(&self, property_id: &str, value: Value) {
        self.base.log(
            LogLevel::Debug,
            format!("set remote property: {property_id}"),
        );
        self.base.emit_write(Message::set_property(property_id, value));
    }

    /// Number of invocations still waiting for a reply.
    pub fn pending_invokes(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl MessageHandler for ClientNode {
    fn base(&self) -> &BaseNode {
        &self.base
    }

    fn handle_init(&self, object_id: &str, props: Value) {
        let Some(sink) = self.registry.get_sink(object_id) else {
            self.base
                .log(LogLevel::Warning, format!("init for unknown object: {object_id}"));
            return;
        };
        let Some(node) = self.self_ref.upgrade() else {
            return;
        };
        self.base
            .log(LogLevel::Debug, format!("init object: {object_id}"));
        sink.olink_on_init(object_id, props, &node);
    }

    fn handle_property_change(&self, property_id: &str, value: Value) {
        let object_id = name::object_id(property_id);
        let Some(sink) = self.registry.get_sink(object_id) else {
            self.base.log(
                LogLevel::Warning,
                format!("property change for unknown object: {object_id}"),
            );
            return;
        };
        sink.olink_on_property_changed(property_id, value);
    }

    fn handle_signal(&self, signal_id: &str, args: Value) {
        let object_id = name::object_id(signal_id);
        let Some(sink) = self.registry.get_sink(object_id) else {
            self.base.log(
                LogLevel::Warning,
                format!("signal for unknown object: {object_id}"),
            );
            return;
        };
        sink.olink_on_signal(signal_id, args);
    }

    fn handle_invoke_reply(&self, request_id: u64, method_id: &str, value: Value) {
        let reply = self.pending.lock().unwrap().remove(&request_id);
        match reply {
            // the callback runs with the lock released so it may re-enter
            // the node
            Some(reply) => {
                self.base.log(
                    LogLevel::Debug,
                    format!("invoke reply: {method_id} (request {request_id})"),
                );
                reply(InvokeReplyArg {
                    method_id: method_id.to_string(),
                    value,
                });
            }
            None => self.base.log(
                LogLevel::Warning,
                format!("no pending invoke for request {request_id}: {method_id}"),
            ),
        }
    }

    fn handle_error(&self, msg_type: MsgType, request_id: u64, error: &str) {
        // a peer error does not fail the matching pending invocation
        self.base.log(
            LogLevel::Error,
            format!("error from peer for {msg_type} message (request {request_id}): {error}"),
        );
    }
}

impl Drop for ClientNode {
    /// Unwinds every link this node established, in establishment order:
    /// emits the unlink frame, releases the sink if it is still alive and
    /// clears the binding. Pending invocations are discarded without
    /// firing their callbacks.
    fn drop(&mut self) {
        let linked = std::mem::take(self.linked.get_mut().unwrap());
        for object_id in linked {
            // another node may have taken over the binding since
            if self.registry.node_id_for(&object_id) != Some(self.node_id) {
                continue;
            }
            self.base
                .log(LogLevel::Info, format!("unlink remote: {object_id}"));
            self.base.emit_write(Message::unlink(&object_id));
            if let Some(sink) = self.registry.get_sink(&object_id) {
                sink.olink_on_release();
            }
            self.registry.unset_node(&object_id);
        }
        self.registry.detach_client_node(self.node_id);
    }
}
