//! Boundary to the host-owned graph.
//!
//! The profiler never mutates host nodes; it only resolves display titles
//! by id. A node that no longer exists simply resolves to `None`.

use common::id_type;

id_type!(NodeId);

pub trait NodeLookup {
    fn node_title(&self, node_id: NodeId) -> Option<String>;
}

/// Title map kept by tests and simple hosts.
impl NodeLookup for hashbrown::HashMap<NodeId, String> {
    fn node_title(&self, node_id: NodeId) -> Option<String> {
        self.get(&node_id).cloned()
    }
}
