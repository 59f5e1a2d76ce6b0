use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use edgeload::core::ids::NodeId;
use edgeload::ingest::synthetic::{
    SyntheticConfig, generate, generate_labels, write_edge_list, write_label_file,
};
use edgeload::{IngestConfig, MalformedPolicy, load_dataset};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = Command::new("edgeload")
        .about("Streams an edge list and a label file into a sparse graph")
        .subcommand_required(true)
        .subcommand(
            Command::new("ingest")
                .about("Load an edge list (and optional labels) and print a summary")
                .arg(
                    Arg::new("edges")
                        .long("edges")
                        .short('e')
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Edge list: one `<source> <target>` pair per line"),
                )
                .arg(
                    Arg::new("labels")
                        .long("labels")
                        .short('l')
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Headerless CSV of `<node id>,<label>` rows"),
                )
                .arg(
                    Arg::new("chunk-size")
                        .long("chunk-size")
                        .short('c')
                        .default_value("10000")
                        .value_parser(clap::value_parser!(NonZeroUsize))
                        .help("Maximum lines held in memory per batch"),
                )
                .arg(
                    Arg::new("skip-malformed")
                        .long("skip-malformed")
                        .action(ArgAction::SetTrue)
                        .help("Skip and count malformed records instead of failing"),
                )
                .arg(
                    Arg::new("neighbors")
                        .long("neighbors")
                        .short('n')
                        .action(ArgAction::Append)
                        .value_parser(clap::value_parser!(NodeId))
                        .help("Print the out-neighbours of this node (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Write a synthetic edge list and label file")
                .arg(
                    Arg::new("nodes")
                        .long("nodes")
                        .required(true)
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("edges")
                        .long("edges")
                        .required(true)
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("labels")
                        .long("labels")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("classes")
                        .long("classes")
                        .default_value("40")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("ingest", sub)) => run_ingest(sub),
        Some(("generate", sub)) => run_generate(sub),
        _ => unreachable!("subcommand is required"),
    }
}

fn run_ingest(args: &ArgMatches) -> anyhow::Result<()> {
    let edges = args
        .get_one::<PathBuf>("edges")
        .context("--edges is required")?;
    let labels = args.get_one::<PathBuf>("labels");
    let mut config = IngestConfig::default();
    if let Some(chunk_size) = args.get_one::<NonZeroUsize>("chunk-size") {
        config = config.with_chunk_size(*chunk_size);
    }
    if args.get_flag("skip-malformed") {
        config = config.with_malformed(MalformedPolicy::Skip);
    }

    let dataset = load_dataset(edges, labels.map(PathBuf::as_path), &config)
        .with_context(|| format!("failed to load {}", edges.display()))?;
    let graph = dataset.graph();
    let edge_stats = dataset.edge_stats();
    let label_stats = dataset.label_stats();

    println!("nodes:            {}", graph.node_count());
    println!("horizon:          {}", dataset.horizon().value());
    println!("edge records:     {}", graph.edge_count());
    println!("distinct entries: {}", graph.nnz());
    println!("skipped edges:    {}", edge_stats.skipped);
    if labels.is_some() {
        println!("labelled nodes:   {}", dataset.labelled_nodes());
        println!(
            "labels outside:   {}",
            dataset.labels().count_outside(graph.node_count())
        );
        println!("skipped labels:   {}", label_stats.skipped);

        let mut per_label = HashMap::new();
        for (_, label) in dataset.labels().iter() {
            *per_label.entry(label).or_insert(0usize) += 1;
        }
        let mut per_label = per_label.into_iter().collect::<Vec<_>>();
        per_label.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
        });
        println!("distinct labels:  {}", per_label.len());
        for (label, count) in per_label.iter().take(5) {
            println!("  {label}: {count}");
        }
    }

    for node in args.get_many::<NodeId>("neighbors").into_iter().flatten() {
        let label = dataset
            .label_of(*node)
            .map_or_else(|| "-".to_string(), |l| l.to_string());
        println!("\n{node} [{label}] out-degree {}", graph.out_degree(*node));
        for edge in graph.edges_from(*node) {
            let dst_label = dataset
                .label_of(edge.dst)
                .map_or_else(|| "-".to_string(), |l| l.to_string());
            println!("  -> {} [{}] x{}", edge.dst, dst_label, edge.weight);
        }
    }

    Ok(())
}

fn run_generate(args: &ArgMatches) -> anyhow::Result<()> {
    let cfg = SyntheticConfig {
        node_count: *args.get_one::<u32>("nodes").context("--nodes is required")?,
        edge_count: *args.get_one::<u64>("edges").context("--edges is required")?,
        seed: *args.get_one::<u64>("seed").unwrap_or(&42),
    };
    let output = args
        .get_one::<PathBuf>("output")
        .context("--output is required")?;

    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let written = write_edge_list(generate(&cfg), BufWriter::new(file))
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {written} edges to {}", output.display());

    if let Some(labels) = args.get_one::<PathBuf>("labels") {
        let classes = *args.get_one::<u32>("classes").unwrap_or(&40);
        let file = File::create(labels)
            .with_context(|| format!("failed to create {}", labels.display()))?;
        let written = write_label_file(
            generate_labels(cfg.node_count, classes, cfg.seed),
            BufWriter::new(file),
        )
        .with_context(|| format!("failed to write {}", labels.display()))?;
        println!("wrote {written} labels to {}", labels.display());
    }

    Ok(())
}
