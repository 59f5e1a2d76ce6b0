use crate::core::ids::{Edge, NodeId};
use crate::ingest::labels::Label;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

pub struct SyntheticConfig {
    pub node_count: u32,
    pub edge_count: u64,
    pub seed: u64,
}

/// Uniform random edges; self-loops and repeated pairs are left in.
pub fn generate(cfg: &SyntheticConfig) -> impl Iterator<Item = Edge> + use<> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let node_count = cfg.node_count;
    let edge_count = if node_count == 0 { 0 } else { cfg.edge_count };

    (0..edge_count).map(move |_| {
        Edge::new(
            rng.random_range(0..node_count),
            rng.random_range(0..node_count),
        )
    })
}

/// One class label in `0..classes` for every node id in `0..node_count`.
pub fn generate_labels(
    node_count: u32,
    classes: u32,
    seed: u64,
) -> impl Iterator<Item = (NodeId, Label)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let classes = classes.max(1);
    (0..node_count).map(move |id| (id, Label::Class(rng.random_range(0..classes) as i64)))
}

pub fn write_edge_list<W: Write>(
    edges: impl IntoIterator<Item = Edge>,
    mut writer: W,
) -> std::io::Result<u64> {
    let mut written = 0;
    for edge in edges {
        writeln!(writer, "{} {}", edge.src, edge.dst)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

pub fn write_label_file<W: Write>(
    labels: impl IntoIterator<Item = (NodeId, Label)>,
    writer: W,
) -> csv::Result<u64> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    let mut written = 0;
    for (id, label) in labels {
        csv_writer.write_record([id.to_string(), label.to_string()])?;
        written += 1;
    }
    csv_writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_seeded() {
        let cfg = SyntheticConfig {
            node_count: 50,
            edge_count: 200,
            seed: 7,
        };
        let a = generate(&cfg).collect::<Vec<_>>();
        let b = generate(&cfg).collect::<Vec<_>>();

        assert_eq!(200, a.len());
        assert_eq!(a, b);
        assert!(a.iter().all(|e| e.src < 50 && e.dst < 50));
    }

    #[test]
    fn test_zero_nodes_yields_no_edges() {
        let cfg = SyntheticConfig {
            node_count: 0,
            edge_count: 10,
            seed: 1,
        };
        assert_eq!(0, generate(&cfg).count());
    }

    #[test]
    fn test_write_edge_list() {
        let mut out = Vec::new();
        let n = write_edge_list([Edge::new(0, 1), Edge::new(2, 2)], &mut out).unwrap();

        assert_eq!(2, n);
        assert_eq!("0 1\n2 2\n", String::from_utf8(out).unwrap());
    }

    #[test]
    fn test_write_label_file() {
        let mut out = Vec::new();
        let labels = generate_labels(3, 4, 9).collect::<Vec<_>>();
        write_label_file(labels.clone(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(3, text.lines().count());
        for ((id, label), line) in labels.iter().zip(text.lines()) {
            assert_eq!(format!("{id},{label}"), line);
        }
    }
}
