use anyhow::{Context, Result};
use biograph::config::Config;
use biograph::graph::{self, KnowledgeGraph};
use biograph::input::{discover_response_files, normalize_files};
use biograph::paths::{self, EdgeRecord, RowFilter};
use biograph::present;
use biograph::resolve::{self, CachingResolver, HttpResolver, IdResolver, StaticResolver};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "biograph", version, about = "Assemble and tabulate biomedical knowledge graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize response files into one graph and print it as JSON
    Build {
        /// Response file or directory of *.json batches
        input: PathBuf,
        /// Identifier kind of the queried inputs (creates typed seed nodes)
        #[arg(long)]
        input_kind: Option<String>,
        /// Entity type of the queried inputs
        #[arg(long)]
        input_type: Option<String>,
        /// Resolve output identifiers with the configured endpoint
        #[arg(long = "resolve")]
        resolve_ids: bool,
        /// Resolve from a static `{key: {kind: ids}}` JSON table instead
        #[arg(long, conflicts_with = "resolve_ids")]
        id_table: Option<PathBuf>,
    },
    /// Merge graph JSON files, earlier files taking precedence for shared nodes
    Merge {
        #[arg(required = true)]
        graphs: Vec<PathBuf>,
    },
    /// Tabulate node-key paths (JSON list of key lists) against a graph
    Paths {
        graph: PathBuf,
        paths: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        /// Emit JSON records instead of CSV
        #[arg(long)]
        json: bool,
    },
    /// Tabulate pre-expanded edge paths (JSON list of edge-record lists)
    EdgePaths {
        paths: PathBuf,
        /// Entity type of the path inputs (the first type of the query path)
        #[arg(long)]
        input_type: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the vis.js payload for a graph
    Vis { graph: PathBuf },
    /// Print the graph's edge list as CSV
    Edges { graph: PathBuf },
    /// Print the graph as Graphviz DOT
    Dot { graph: PathBuf },
}

#[derive(clap::Args)]
struct FilterArgs {
    #[arg(long)]
    pred1: Option<String>,
    #[arg(long)]
    pred2: Option<String>,
    /// Exact match on node1_id
    #[arg(long)]
    intermediate: Option<String>,
    /// Exact match on node1_type
    #[arg(long)]
    intermediate_type: Option<String>,
}

impl From<FilterArgs> for RowFilter {
    fn from(args: FilterArgs) -> Self {
        RowFilter {
            pred1: args.pred1,
            pred2: args.pred2,
            intermediate: args.intermediate,
            intermediate_type: args.intermediate_type,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"))
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Command::Build {
            input,
            input_kind,
            input_type,
            resolve_ids,
            id_table,
        } => {
            let mut graph =
                build_graph(&config, &input, input_kind.as_deref(), input_type.as_deref())?;
            let resolver: Option<Box<dyn IdResolver>> = match (resolve_ids, id_table) {
                (_, Some(path)) => {
                    let table = StaticResolver::from_json_file(&path)
                        .with_context(|| format!("Failed to load id table {}", path.display()))?;
                    Some(Box::new(table) as Box<dyn IdResolver>)
                }
                (true, None) => Some(build_http_resolver(&config)?),
                (false, None) => None,
            };
            if let Some(resolver) = resolver {
                let outcome = resolve::resolve(&mut graph, resolver.as_ref()).await;
                for failure in &outcome.failures {
                    log::warn!("{}", failure);
                }
            }
            print_json(&graph)?;
        }
        Command::Merge { graphs } => {
            let loaded = graphs
                .iter()
                .map(|p| read_graph(p))
                .collect::<Result<Vec<_>>>()?;
            let merged = graph::merge_all(loaded);
            log::info!(
                "Merged {} graphs: {} nodes, {} edges",
                graphs.len(),
                merged.node_count(),
                merged.edge_count()
            );
            print_json(&merged)?;
        }
        Command::Paths {
            graph,
            paths: paths_file,
            filter,
            json,
        } => {
            let g = read_graph(&graph)?;
            let node_paths: Vec<Vec<String>> = read_json(&paths_file)?;
            let filter: RowFilter = filter.into();
            let table = paths::tabulate_node_paths(&g, &node_paths, &config.tabular, &filter)?;
            if json {
                print_json(&table.to_json_records())?;
            } else {
                table.write_csv(std::io::stdout().lock())?;
            }
        }
        Command::EdgePaths {
            paths: paths_file,
            input_type,
            json,
        } => {
            let edge_paths: Vec<Vec<EdgeRecord>> = read_json(&paths_file)?;
            let table = paths::tabulate_edge_paths(&edge_paths, input_type.as_deref())?;
            if json {
                print_json(&table.to_json_records())?;
            } else {
                table.write_csv(std::io::stdout().lock())?;
            }
        }
        Command::Vis { graph } => {
            let g = read_graph(&graph)?;
            print_json(&present::to_visjs(&g, &config.presentation))?;
        }
        Command::Edges { graph } => {
            let g = read_graph(&graph)?;
            present::edge_table(&g).write_csv(std::io::stdout().lock())?;
        }
        Command::Dot { graph } => {
            let g = read_graph(&graph)?;
            print!("{}", present::to_dot(&g));
        }
    }

    Ok(())
}

/// Use the config file when one is present, otherwise built-in defaults.
fn load_config() -> Result<Config> {
    let _ = dotenv::dotenv();
    let explicit = std::env::var("BIOGRAPH_CONFIG").is_ok();
    if explicit || Path::new("biograph.toml").exists() {
        let config = Config::load()?;
        log::info!("Configuration loaded successfully");
        Ok(config)
    } else {
        log::info!("No biograph.toml found, using default configuration");
        Ok(Config::default())
    }
}

/// Normalize every response file into one graph, one file at a time.
fn build_graph(
    config: &Config,
    input: &Path,
    input_kind: Option<&str>,
    input_type: Option<&str>,
) -> Result<KnowledgeGraph> {
    let files = discover_response_files(input)?;
    if files.is_empty() {
        anyhow::bail!("No response files found in {}", input.display());
    }

    let mut graph = KnowledgeGraph::new();
    if input_kind.is_some() || input_type.is_some() {
        for key in files.iter().flat_map(|f| f.batch.keys()) {
            if !graph.contains_node(key) {
                graph.add_seed(key, input_kind, input_type.map(Into::into));
            }
        }
    }

    let stats = normalize_files(&files, &mut graph, &config.graph)
        .with_context(|| format!("Failed to normalize responses in {}", input.display()))?;
    log::info!(
        "Built graph from {} files: {} nodes, {} edges ({} skipped values)",
        files.len(),
        graph.node_count(),
        graph.edge_count(),
        stats.skipped_values
    );

    Ok(graph)
}

fn build_http_resolver(config: &Config) -> Result<Box<dyn IdResolver>> {
    let endpoint = config
        .resolver
        .endpoint
        .clone()
        .context("--resolve requires resolver.endpoint in biograph.toml")?;
    let http = HttpResolver::new(endpoint, Duration::from_secs(config.resolver.timeout_secs))?;
    if config.resolver.cache_capacity > 0 {
        Ok(Box::new(CachingResolver::new(http, config.resolver.cache_capacity)))
    } else {
        Ok(Box::new(http))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_graph(path: &Path) -> Result<KnowledgeGraph> {
    read_json(path)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
