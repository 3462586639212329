//! Shared directory binding object ids to sources and their linked nodes.

use crate::node::RemoteNode;
use crate::source::ObjectSource;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[derive(Default)]
struct SourceEntry {
    source: Option<Weak<dyn ObjectSource>>,
    /// Nodes currently linked against this object, keyed by node id.
    nodes: HashMap<u64, Weak<RemoteNode>>,
}

struct RegistryInner {
    entries: DashMap<String, SourceEntry>,
    next_node_id: AtomicU64,
}

/// Directory shared by every remote node on the serving side.
///
/// Unlike the client side, where one node serves an object, a source may
/// be linked by many nodes at once, one per connected peer, so each
/// entry carries a node *set*. Reads hand out snapshots, so sources can
/// iterate and notify without holding registry locks.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct RemoteRegistry {
    inner: Arc<RegistryInner>,
}

impl RemoteRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: DashMap::new(),
                next_node_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers a source under its object name. The registry keeps a weak
    /// handle only; the application stays the owner.
    pub fn add_source(&self, source: Arc<dyn ObjectSource>) {
        let object_id = source.olink_object_name();
        tracing::debug!(object_id = %object_id, "add source");
        let mut entry = self.inner.entries.entry(object_id).or_default();
        entry.source = Some(Arc::downgrade(&source));
    }

    /// Drops the entry for an object id.
    pub fn remove_source(&self, object_id: &str) {
        tracing::debug!(object_id, "remove source");
        self.inner.entries.remove(object_id);
    }

    /// Looks up a live source.
    pub fn get_source(&self, object_id: &str) -> Option<Arc<dyn ObjectSource>> {
        let entry = self.inner.entries.get(object_id)?;
        entry.source.as_ref()?.upgrade()
    }

    /// Adds a node to the set serving an object.
    pub fn link_remote_node(&self, object_id: &str, node: &Arc<RemoteNode>) {
        let mut entry = self.inner.entries.entry(object_id.to_string()).or_default();
        entry.nodes.insert(node.node_id(), Arc::downgrade(node));
    }

    /// Removes a node from the set serving an object.
    pub fn unlink_remote_node(&self, object_id: &str, node_id: u64) {
        if let Some(mut entry) = self.inner.entries.get_mut(object_id) {
            entry.nodes.remove(&node_id);
        }
    }

    /// Snapshot of the live nodes currently linked against an object.
    pub fn get_remote_nodes(&self, object_id: &str) -> Vec<Arc<RemoteNode>> {
        match self.inner.entries.get(object_id) {
            Some(entry) => entry.nodes.values().filter_map(Weak::upgrade).collect(),
            None => Vec::new(),
        }
    }

    /// Admits a node and assigns it a unique id. Called by the node
    /// factory.
    pub fn attach_remote_node(&self) -> u64 {
        let node_id = self.inner.next_node_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(node_id, "attach remote node");
        node_id
    }

    /// Retires a node id and removes it from every node set.
    pub fn detach_remote_node(&self, node_id: u64) {
        tracing::debug!(node_id, "detach remote node");
        for mut entry in self.inner.entries.iter_mut() {
            entry.nodes.remove(&node_id);
        }
    }
}

impl Default for RemoteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct NullSource {
        name: String,
    }

    impl NullSource {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
            })
        }
    }

    impl ObjectSource for NullSource {
        fn olink_object_name(&self) -> String {
            self.name.clone()
        }
        fn olink_invoke(&self, _method_id: &str, _args: Value) -> Value {
            json!(null)
        }
        fn olink_set_property(&self, _property_id: &str, _value: Value) {}
        fn olink_linked(&self, _object_id: &str, _node: &Arc<RemoteNode>) {}
        fn olink_unlinked(&self, _object_id: &str) {}
        fn olink_collect_properties(&self) -> Value {
            json!({})
        }
    }

    #[test]
    fn test_add_and_get_source() {
        let registry = RemoteRegistry::new();
        let source = NullSource::new("tests.source1");
        registry.add_source(source.clone());

        assert!(registry.get_source("tests.source1").is_some());
        assert!(registry.get_source("tests.source2").is_none());
    }

    #[test]
    fn test_registry_does_not_keep_sources_alive() {
        let registry = RemoteRegistry::new();
        let source = NullSource::new("tests.source1");
        registry.add_source(source.clone());

        drop(source);
        assert!(registry.get_source("tests.source1").is_none());
    }

    #[test]
    fn test_remove_source() {
        let registry = RemoteRegistry::new();
        let source = NullSource::new("tests.source1");
        registry.add_source(source.clone());

        registry.remove_source("tests.source1");
        assert!(registry.get_source("tests.source1").is_none());
    }

    #[test]
    fn test_link_and_unlink_nodes() {
        let registry = RemoteRegistry::new();
        let source = NullSource::new("tests.source1");
        registry.add_source(source.clone());

        let first = RemoteNode::create(registry.clone());
        let second = RemoteNode::create(registry.clone());
        registry.link_remote_node("tests.source1", &first);
        registry.link_remote_node("tests.source1", &second);
        assert_eq!(registry.get_remote_nodes("tests.source1").len(), 2);

        registry.unlink_remote_node("tests.source1", first.node_id());
        let nodes = registry.get_remote_nodes("tests.source1");
        assert_eq!(nodes.len(), 1);
        assert!(Arc::ptr_eq(&nodes[0], &second));
    }

    #[test]
    fn test_snapshot_excludes_dropped_nodes() {
        let registry = RemoteRegistry::new();
        let source = NullSource::new("tests.source1");
        registry.add_source(source.clone());

        let node = RemoteNode::create(registry.clone());
        registry.link_remote_node("tests.source1", &node);
        drop(node);

        assert!(registry.get_remote_nodes("tests.source1").is_empty());
    }

    #[test]
    fn test_detach_removes_node_from_all_sets() {
        let registry = RemoteRegistry::new();
        let source1 = NullSource::new("tests.source1");
        let source2 = NullSource::new("tests.source2");
        registry.add_source(source1.clone());
        registry.add_source(source2.clone());

        let node = RemoteNode::create(registry.clone());
        registry.link_remote_node("tests.source1", &node);
        registry.link_remote_node("tests.source2", &node);

        registry.detach_remote_node(node.node_id());
        assert!(registry.get_remote_nodes("tests.source1").is_empty());
        assert!(registry.get_remote_nodes("tests.source2").is_empty());
    }
}
