//! boardgraph CLI: build, cache and inspect catalogue relationship graphs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use boardgraph::config::ServiceConfig;
use boardgraph::graph::GraphKind;
use boardgraph::service::GraphService;

#[derive(Parser)]
#[command(name = "boardgraph", version, about = "Board-game relationship graphs")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for the durable store (overrides the config).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON catalogue file (overrides the config).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build graphs and save them to the store.
    Build {
        /// Graph kind, e.g. `heterogeneous` or `designer-designer`.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        kind: Option<String>,

        /// Build every kind.
        #[arg(long)]
        all: bool,
    },

    /// Print a stored graph as JSON.
    Show {
        kind: String,

        /// Build in memory (without saving) if nothing is stored.
        #[arg(long)]
        build: bool,
    },

    /// Show node and edge counts of a stored graph.
    Stats { kind: String },

    /// List graph kinds and whether each is stored.
    List,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir.clone();
    }
    if cli.catalog.is_some() {
        config.catalog = cli.catalog.clone();
    }

    let service = GraphService::from_config(config)?;

    match cli.command {
        Commands::Build { kind, all } => {
            let reports = if all {
                service.build_and_save_all()?
            } else {
                let kind = parse_kind(kind.as_deref().unwrap_or_default())?;
                vec![service.build_and_save(kind)?]
            };
            for report in &reports {
                match &report.layout {
                    Some(layout) => println!(
                        "{:<20} {:>7} nodes {:>8} edges  {} communities (Q = {:.3})",
                        report.kind, report.nodes, report.edges, layout.communities, layout.modularity
                    ),
                    None => println!(
                        "{:<20} {:>7} nodes {:>8} edges",
                        report.kind, report.nodes, report.edges
                    ),
                }
            }
        }

        Commands::Show { kind, build } => {
            let kind = parse_kind(&kind)?;
            let graph = if build {
                service.get_or_build(kind)?
            } else {
                match service.load(kind)? {
                    Some(graph) => graph,
                    None => {
                        return Err(miette::miette!(
                            help = format!("Run `boardgraph build {kind}` first, or pass --build."),
                            "no stored graph for `{kind}`"
                        ));
                    }
                }
            };
            println!("{}", graph.to_json_pretty()?);
        }

        Commands::Stats { kind } => {
            let kind = parse_kind(&kind)?;
            match service.load_record(kind)? {
                Some(record) => {
                    let graph = boardgraph::graph::Graph::from_document(record.document)?;
                    let stats = graph.statistics();
                    println!("Graph: {kind}");
                    println!("  updated_at: {}", record.updated_at);
                    println!("  nodes: {}", stats.total_nodes);
                    for (t, n) in &stats.nodes_by_type {
                        println!("    {t}: {n}");
                    }
                    println!("  edges: {}", stats.total_edges);
                    for (t, n) in &stats.edges_by_type {
                        println!("    {t}: {n}");
                    }
                    if let Some(layout) = record.metadata.get("layout") {
                        println!(
                            "  layout: {}",
                            serde_json::to_string(layout).into_diagnostic()?
                        );
                    }
                }
                None => println!("No stored graph for `{kind}`."),
            }
        }

        Commands::List => {
            for info in service.available()? {
                let mark = if info.stored { "*" } else { " " };
                println!("{mark} {:<20} {}", info.kind, info.description);
            }
        }
    }

    Ok(())
}

fn parse_kind(s: &str) -> Result<GraphKind> {
    Ok(s.parse::<GraphKind>()?)
}
