//! Shared directory binding object ids to sinks and their client nodes.

use crate::node::ClientNode;
use crate::sink::ObjectSink;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[derive(Default)]
struct SinkEntry {
    sink: Option<Weak<dyn ObjectSink>>,
    /// The node currently serving this object, tagged with its registry id
    /// so a dropped node can still be recognized during teardown.
    node: Option<(u64, Weak<ClientNode>)>,
}

struct RegistryInner {
    entries: DashMap<String, SinkEntry>,
    next_node_id: AtomicU64,
}

/// Directory shared by every client node on one side of a deployment.
///
/// Holds one entry per object id with a weak handle to the sink and a weak
/// handle to the node serving it; at most one node serves an object id at
/// a time, and re-linking replaces the prior binding. Entries never extend
/// the lifetime of sinks or nodes.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct ClientRegistry {
    inner: Arc<RegistryInner>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: DashMap::new(),
                next_node_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers a sink under its object name. The registry keeps a weak
    /// handle only; the caller stays the owner.
    pub fn add_sink(&self, sink: Arc<dyn ObjectSink>) {
        let object_id = sink.olink_object_name();
        tracing::debug!(object_id = %object_id, "add sink");
        let mut entry = self.inner.entries.entry(object_id).or_default();
        entry.sink = Some(Arc::downgrade(&sink));
    }

    /// Drops the entry for an object id.
    pub fn remove_sink(&self, object_id: &str) {
        tracing::debug!(object_id, "remove sink");
        self.inner.entries.remove(object_id);
    }

    /// Looks up a live sink. `None` covers both "never registered" and
    /// "registered but since dropped".
    pub fn get_sink(&self, object_id: &str) -> Option<Arc<dyn ObjectSink>> {
        let entry = self.inner.entries.get(object_id)?;
        entry.sink.as_ref()?.upgrade()
    }

    /// Binds a node as the handler for an object id, creating the entry on
    /// demand: a node may link before the sink registers.
    pub fn set_node(&self, object_id: &str, node: &Arc<ClientNode>) {
        let mut entry = self.inner.entries.entry(object_id.to_string()).or_default();
        if entry.node.is_some() {
            tracing::debug!(object_id, "replacing node binding");
        }
        entry.node = Some((node.node_id(), Arc::downgrade(node)));
    }

    /// Clears the node binding for an object id.
    pub fn unset_node(&self, object_id: &str) {
        if let Some(mut entry) = self.inner.entries.get_mut(object_id) {
            entry.node = None;
        }
    }

    /// Looks up the live node currently bound to an object id.
    pub fn get_node(&self, object_id: &str) -> Option<Arc<ClientNode>> {
        let entry = self.inner.entries.get(object_id)?;
        entry.node.as_ref()?.1.upgrade()
    }

    pub(crate) fn node_id_for(&self, object_id: &str) -> Option<u64> {
        let entry = self.inner.entries.get(object_id)?;
        entry.node.as_ref().map(|(node_id, _)| *node_id)
    }

    /// Admits a node and assigns it a unique id. Called by the node
    /// factory; nodes register themselves, not the application.
    pub fn attach_client_node(&self) -> u64 {
        let node_id = self.inner.next_node_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(node_id, "attach client node");
        node_id
    }

    /// Retires a node id and clears any bindings still pointing at it.
    pub fn detach_client_node(&self, node_id: u64) {
        tracing::debug!(node_id, "detach client node");
        for mut entry in self.inner.entries.iter_mut() {
            if matches!(entry.node, Some((bound, _)) if bound == node_id) {
                entry.node = None;
            }
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
