pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
}

impl Edge {
    pub fn new(src: NodeId, dst: NodeId) -> Self {
        Self { src, dst }
    }
}

/// Running maximum node id over every edge observed.
///
/// The result depends only on the set of edges seen, never on their order,
/// so trackers filled from disjoint batches can be merged in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HorizonTracker {
    max: Option<NodeId>,
}

impl HorizonTracker {
    pub fn new() -> Self {
        Self { max: None }
    }

    pub fn observe(&mut self, edge: Edge) {
        self.observe_id(edge.src.max(edge.dst));
    }

    pub fn observe_id(&mut self, id: NodeId) {
        self.max = Some(self.max.map_or(id, |m| m.max(id)));
    }

    pub fn merge(&mut self, other: &HorizonTracker) {
        if let Some(id) = other.max {
            self.observe_id(id);
        }
    }

    /// Highest id seen, or -1 when nothing was observed.
    pub fn value(&self) -> i64 {
        self.max.map_or(-1, i64::from)
    }

    pub fn node_count(&self) -> usize {
        self.max.map_or(0, |m| m as usize + 1)
    }
}
