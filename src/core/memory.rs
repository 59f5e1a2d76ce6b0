use crate::core::ids::NodeId;

pub struct MemoryStats {
    pub edges: usize,
    pub bytes: usize,
}

/// Bytes held by the row and column sequences for `edges` accumulated edges.
pub fn estimate_coordinate_memory(edges: usize) -> MemoryStats {
    MemoryStats {
        edges,
        bytes: edges * 2 * size_of::<NodeId>(),
    }
}
