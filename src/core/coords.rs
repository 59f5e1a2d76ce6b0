use crate::core::ids::{Edge, NodeId};
use crate::error::ShapeError;

/// Parallel row/column sequences in edge arrival order (COO form, unit weights).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinateLists {
    rows: Vec<NodeId>,
    cols: Vec<NodeId>,
}

impl CoordinateLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(edges: usize) -> Self {
        Self {
            rows: Vec::with_capacity(edges),
            cols: Vec::with_capacity(edges),
        }
    }

    /// Rejects sequences of unequal length.
    pub fn from_parts(rows: Vec<NodeId>, cols: Vec<NodeId>) -> Result<Self, ShapeError> {
        if rows.len() != cols.len() {
            return Err(ShapeError::LengthMismatch {
                rows: rows.len(),
                cols: cols.len(),
            });
        }
        Ok(Self { rows, cols })
    }

    pub fn push(&mut self, edge: Edge) {
        self.rows.push(edge.src);
        self.cols.push(edge.dst);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }

    pub fn cols(&self) -> &[NodeId] {
        &self.cols
    }

    pub fn into_parts(self) -> (Vec<NodeId>, Vec<NodeId>) {
        (self.rows, self.cols)
    }
}

impl Extend<Edge> for CoordinateLists {
    fn extend<I: IntoIterator<Item = Edge>>(&mut self, iter: I) {
        for edge in iter {
            self.push(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_alignment() {
        let mut coords = CoordinateLists::new();
        coords.push(Edge::new(0, 1));
        coords.push(Edge::new(2, 0));
        coords.push(Edge::new(0, 1));

        assert_eq!(3, coords.len());
        assert_eq!(&[0, 2, 0], coords.rows());
        assert_eq!(&[1, 0, 1], coords.cols());
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        assert_eq!(
            Err(ShapeError::LengthMismatch { rows: 2, cols: 1 }),
            CoordinateLists::from_parts(vec![0, 1], vec![0])
        );
    }

    #[test]
    fn test_extend_and_into_parts() {
        let mut coords = CoordinateLists::with_capacity(2);
        assert!(coords.is_empty());
        coords.extend([Edge::new(5, 6), Edge::new(7, 8)]);
        assert_eq!((vec![5, 7], vec![6, 8]), coords.into_parts());
    }
}
