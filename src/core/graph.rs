use crate::core::coords::CoordinateLists;
use crate::core::ids::{HorizonTracker, NodeId};
use crate::error::ShapeError;

/// Assembles the adjacency matrix from the finished coordinate lists.
///
/// The matrix is `horizon + 1` square; ids in that range that never appear
/// in an edge become isolated nodes. An empty input yields the 0x0 graph.
pub fn build_sparse_graph(
    coords: CoordinateLists,
    horizon: &HorizonTracker,
) -> Result<Graph, ShapeError> {
    let (rows, cols) = coords.into_parts();
    Graph::from_coo(rows, cols, horizon.node_count())
}

/// Square sparse adjacency matrix with edge multiplicities as weights.
///
/// Stored twice: compressed by row for out-edges and compressed by column
/// for in-edges. Within a row entries are sorted by column, and within a
/// column by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    node_count: usize,
    edge_count: usize,
    offsets_out: Vec<usize>,
    dsts: Vec<NodeId>,
    weights_out: Vec<u32>,
    offsets_in: Vec<usize>,
    srcs_in: Vec<NodeId>,
    weights_in: Vec<u32>,
}

/// Bytes needed by the per-node offset and scratch arrays of one build.
pub fn index_bytes(node_count: usize) -> Result<usize, ShapeError> {
    // two offset arrays and one cursor array, plus the temporary row offsets
    node_count
        .checked_add(1)
        .and_then(|n| n.checked_mul(4 * size_of::<usize>()))
        .filter(|bytes| *bytes <= isize::MAX as usize)
        .ok_or(ShapeError::TooLarge { node_count })
}

/// Zero-filled vector whose allocation failure is reported instead of aborting.
fn zeroed<T: Copy + Default>(len: usize, node_count: usize) -> Result<Vec<T>, ShapeError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| ShapeError::TooLarge { node_count })?;
    v.resize(len, T::default());
    Ok(v)
}

impl Graph {
    fn new(node_count: usize) -> Result<Self, ShapeError> {
        index_bytes(node_count)?;
        Ok(Self {
            node_count,
            edge_count: 0,
            offsets_out: zeroed(node_count + 1, node_count)?,
            dsts: vec![],
            weights_out: vec![],
            offsets_in: zeroed(node_count + 1, node_count)?,
            srcs_in: vec![],
            weights_in: vec![],
        })
    }

    /// Builds from coordinate form. Repeated `(row, col)` pairs are summed.
    pub fn from_coo(
        rows: Vec<NodeId>,
        cols: Vec<NodeId>,
        node_count: usize,
    ) -> Result<Self, ShapeError> {
        if rows.len() != cols.len() {
            return Err(ShapeError::LengthMismatch {
                rows: rows.len(),
                cols: cols.len(),
            });
        }
        if let Some(&index) = rows
            .iter()
            .chain(cols.iter())
            .find(|id| **id as usize >= node_count)
        {
            return Err(ShapeError::IndexOutOfRange { index, node_count });
        }

        let mut graph = Graph::new(node_count)?;
        if rows.is_empty() {
            return Ok(graph);
        }
        graph.edge_count = rows.len();

        let mut buf = zeroed::<usize>(node_count, node_count)?;

        // store number of edges per src node
        for src in &rows {
            buf[*src as usize] += 1;
        }

        // compute edge offsets per src node
        let mut row_offsets = zeroed::<usize>(node_count + 1, node_count)?;
        let mut next = 0;
        for (i, edges) in buf.iter().enumerate() {
            row_offsets[i] = next;
            next += edges;
            row_offsets[i + 1] = next;
        }

        // bucket the targets by source
        buf.fill(0);
        let mut bucketed = zeroed::<NodeId>(rows.len(), node_count)?;
        for (src, dst) in rows.iter().zip(cols.iter()) {
            let src = *src as usize;
            bucketed[row_offsets[src] + buf[src]] = *dst;
            buf[src] += 1;
        }
        drop(rows);
        drop(cols);

        // sort each row and collapse duplicates into weights
        for src in 0..node_count {
            let row = &mut bucketed[row_offsets[src]..row_offsets[src + 1]];
            row.sort_unstable();
            let mut i = 0;
            while i < row.len() {
                let dst = row[i];
                let run = row[i..].iter().take_while(|d| **d == dst).count();
                graph.dsts.push(dst);
                graph.weights_out.push(u32::try_from(run).unwrap_or(u32::MAX));
                i += run;
            }
            graph.offsets_out[src + 1] = graph.dsts.len();
        }
        graph.dsts.shrink_to_fit();
        graph.weights_out.shrink_to_fit();
        drop(bucketed);

        // store number of entries per dst node
        buf.fill(0);
        for dst in &graph.dsts {
            buf[*dst as usize] += 1;
        }

        // compute entry offsets per dst node
        next = 0;
        for (i, entries) in buf.iter().enumerate() {
            graph.offsets_in[i] = next;
            next += entries;
            graph.offsets_in[i + 1] = next;
        }

        buf.fill(0);
        graph.srcs_in = zeroed(graph.dsts.len(), node_count)?;
        graph.weights_in = zeroed(graph.dsts.len(), node_count)?;
        for src in 0..node_count {
            for e in graph.offsets_out[src]..graph.offsets_out[src + 1] {
                let dst = graph.dsts[e] as usize;
                let idx = graph.offsets_in[dst] + buf[dst];
                graph.srcs_in[idx] = src as NodeId;
                graph.weights_in[idx] = graph.weights_out[e];
                buf[dst] += 1;
            }
        }

        Ok(graph)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of edge records the graph was built from (sum of all weights).
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of distinct `(row, col)` entries.
    pub fn nnz(&self) -> usize {
        self.dsts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Multiplicity of the `(src, dst)` entry; 0 when absent or out of range.
    pub fn get(&self, src: NodeId, dst: NodeId) -> u32 {
        let src = src as usize;
        if src >= self.node_count {
            return 0;
        }
        let (start, end) = (self.offsets_out[src], self.offsets_out[src + 1]);
        match self.dsts[start..end].binary_search(&dst) {
            Ok(idx) => self.weights_out[start + idx],
            Err(_) => 0,
        }
    }

    /// Out-edges of `src`; empty when `src` is outside the graph.
    pub fn edges_from(&self, src: NodeId) -> impl Iterator<Item = OutgoingEdgeRef> + '_ {
        let (start, end) = Self::range(&self.offsets_out, src);
        self.dsts[start..end]
            .iter()
            .zip(&self.weights_out[start..end])
            .map(|(dst, weight)| OutgoingEdgeRef::new(*dst, *weight))
    }

    /// In-edges of `dst`; empty when `dst` is outside the graph.
    pub fn edges_to(&self, dst: NodeId) -> impl Iterator<Item = IncomingEdgeRef> + '_ {
        let (start, end) = Self::range(&self.offsets_in, dst);
        self.srcs_in[start..end]
            .iter()
            .zip(&self.weights_in[start..end])
            .map(|(src, weight)| IncomingEdgeRef::new(*src, *weight))
    }

    pub fn out_degree(&self, src: NodeId) -> usize {
        self.edges_from(src).map(|e| e.weight as usize).sum()
    }

    pub fn in_degree(&self, dst: NodeId) -> usize {
        self.edges_to(dst).map(|e| e.weight as usize).sum()
    }

    /// All `(row, col, weight)` entries in row-major order.
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, NodeId, u32)> + '_ {
        (0..self.node_count).flat_map(move |src| {
            let src = src as NodeId;
            self.edges_from(src).map(move |e| (src, e.dst, e.weight))
        })
    }

    fn range(offsets: &[usize], node: NodeId) -> (usize, usize) {
        let node = node as usize;
        if node + 1 < offsets.len() {
            (offsets[node], offsets[node + 1])
        } else {
            (0, 0)
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct OutgoingEdgeRef {
    pub dst: NodeId,
    pub weight: u32,
}

impl OutgoingEdgeRef {
    pub fn new(dst: NodeId, weight: u32) -> Self {
        Self { dst, weight }
    }
}

#[derive(Debug, PartialEq)]
pub struct IncomingEdgeRef {
    pub src: NodeId,
    pub weight: u32,
}

impl IncomingEdgeRef {
    pub fn new(src: NodeId, weight: u32) -> Self {
        Self { src, weight }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::Edge;

    fn build(edges: &[(NodeId, NodeId)]) -> Graph {
        let mut coords = CoordinateLists::new();
        let mut horizon = HorizonTracker::new();
        for &(src, dst) in edges {
            let edge = Edge::new(src, dst);
            coords.push(edge);
            horizon.observe(edge);
        }
        build_sparse_graph(coords, &horizon).unwrap()
    }

    #[test]
    fn test_no_edges() {
        let g = build(&[]);

        assert_eq!(0, g.node_count());
        assert_eq!(0, g.edge_count());
        assert_eq!(vec![0], g.offsets_out);
        assert_eq!(0, g.edges_from(0).count());
        assert_eq!(0, g.edges_to(0).count());
        assert_eq!(0, g.get(0, 0));
    }

    #[test]
    fn test_isolated_nodes_without_edges() {
        let g = Graph::from_coo(vec![], vec![], 2).unwrap();
        assert!(!g.is_empty());

        assert_eq!(2, g.node_count());
        assert!(g.offsets_out.iter().all(|off| *off == 0));
        assert_eq!(0, g.edges_from(0).count());
        assert_eq!(0, g.edges_from(1).count());
        assert_eq!(0, g.edges_to(1).count());
    }

    #[test]
    fn test_single_edge() {
        let g = build(&[(0, 1)]);

        assert_eq!(vec![0, 1, 1], g.offsets_out);
        assert_eq!(Some(OutgoingEdgeRef::new(1, 1)), g.edges_from(0).next());
        assert_eq!(None, g.edges_from(1).next());

        assert_eq!(Some(IncomingEdgeRef::new(0, 1)), g.edges_to(1).next());
        assert_eq!(None, g.edges_to(0).next());
    }

    #[test]
    fn test_duplicates_sum() {
        let g = build(&[(0, 1), (1, 2), (0, 1)]);

        assert_eq!(3, g.node_count());
        assert_eq!(3, g.edge_count());
        assert_eq!(2, g.nnz());
        assert_eq!(2, g.get(0, 1));
        assert_eq!(1, g.get(1, 2));
        for (r, c) in [(0, 0), (0, 2), (1, 0), (1, 1), (2, 0), (2, 1), (2, 2)] {
            assert_eq!(0, g.get(r, c));
        }
        assert_eq!(2, g.out_degree(0));
        assert_eq!(2, g.in_degree(1));
    }

    #[test]
    fn test_rows_sorted_by_column() {
        let g = build(&[(0, 3), (0, 1), (0, 2), (0, 1)]);

        let mut iter = g.edges_from(0);
        assert_eq!(Some(OutgoingEdgeRef::new(1, 2)), iter.next());
        assert_eq!(Some(OutgoingEdgeRef::new(2, 1)), iter.next());
        assert_eq!(Some(OutgoingEdgeRef::new(3, 1)), iter.next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn test_single_destination_edges() {
        let g = build(&[(3, 0), (1, 0), (2, 0)]);

        assert_eq!(vec![0, 3, 3, 3, 3], g.offsets_in);
        let mut iter = g.edges_to(0);
        assert_eq!(Some(IncomingEdgeRef::new(1, 1)), iter.next());
        assert_eq!(Some(IncomingEdgeRef::new(2, 1)), iter.next());
        assert_eq!(Some(IncomingEdgeRef::new(3, 1)), iter.next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn test_multiple_edges() {
        let g = build(&[(0, 2), (2, 0), (0, 1), (1, 2)]);

        assert_eq!(vec![0, 2, 3, 4], g.offsets_out);
        assert_eq!(vec![0, 1, 2, 4], g.offsets_in);
        assert_eq!(
            vec![(0, 1, 1), (0, 2, 1), (1, 2, 1), (2, 0, 1)],
            g.entries().collect::<Vec<_>>()
        );
        let mut iter = g.edges_to(2);
        assert_eq!(Some(IncomingEdgeRef::new(0, 1)), iter.next());
        assert_eq!(Some(IncomingEdgeRef::new(1, 1)), iter.next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn test_self_loop() {
        let g = build(&[(1, 1), (1, 1)]);

        assert_eq!(2, g.node_count());
        assert_eq!(2, g.get(1, 1));
        assert_eq!(Some(IncomingEdgeRef::new(1, 2)), g.edges_to(1).next());
    }

    #[test]
    fn test_out_of_range_node_is_empty() {
        let g = build(&[(0, 1)]);

        assert_eq!(0, g.edges_from(5).count());
        assert_eq!(0, g.edges_to(u32::MAX).count());
        assert_eq!(0, g.get(9, 0));
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            Err(ShapeError::LengthMismatch { rows: 2, cols: 1 }),
            Graph::from_coo(vec![0, 1], vec![1], 2)
        );
    }

    #[test]
    fn test_index_beyond_horizon() {
        assert_eq!(
            Err(ShapeError::IndexOutOfRange {
                index: 3,
                node_count: 3
            }),
            Graph::from_coo(vec![0, 1], vec![1, 3], 3)
        );
    }

    #[test]
    fn test_index_bytes_near_max_id() {
        let node_count = u32::MAX as usize + 1;
        #[cfg(target_pointer_width = "64")]
        assert_eq!(
            Ok((node_count + 1) * 4 * size_of::<usize>()),
            index_bytes(node_count)
        );
        assert_eq!(
            Err(ShapeError::TooLarge {
                node_count: usize::MAX
            }),
            index_bytes(usize::MAX)
        );
    }

    #[test]
    fn test_unreservable_allocation_is_an_error() {
        assert_eq!(
            Err(ShapeError::TooLarge { node_count: 7 }),
            zeroed::<usize>(usize::MAX / 2, 7)
        );
    }

    #[test]
    fn test_oversized_graph_rejected_before_allocating() {
        assert_eq!(
            Err(ShapeError::TooLarge {
                node_count: usize::MAX / 8
            }),
            Graph::from_coo(vec![], vec![], usize::MAX / 8)
        );
    }
}
