//! Command-line miner: imports a XES event log and writes a heuristic net or an alpha graph.
//!
//! ```bash
//! # Heuristic net, keeping activities occurring at least 5 times
//! flow-miner log.xes.gz --min-activity-freq 5
//!
//! # Alpha graph rendered as SVG (next to its DOT source)
//! flow-miner log.xes --miner alpha --format svg --output-dir out/
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flow_miner::{
    export_graph_image_png, export_graph_image_svg, graph_model_to_dot, import_xes_file, mine,
    MinerConfig, MinerError, MinerType, XESImportOptions,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Discover process graphs from XES event logs
#[derive(Parser, Debug)]
#[command(name = "flow-miner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Event log (`.xes` or `.xes.gz`)
    log: PathBuf,

    /// Miner to run (overrides the configuration file)
    #[arg(short, long, value_enum)]
    miner: Option<MinerArg>,

    /// Minimal activity frequency of the heuristic miner (overrides the configuration file)
    #[arg(long)]
    min_activity_freq: Option<u64>,

    /// Minimal transition frequency of the heuristic miner (overrides the configuration file)
    #[arg(long)]
    min_transition_freq: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to write the output to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "dot")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MinerArg {
    Heuristic,
    Alpha,
}

impl From<MinerArg> for MinerType {
    fn from(value: MinerArg) -> Self {
        match value {
            MinerArg::Heuristic => MinerType::Heuristic,
            MinerArg::Alpha => MinerType::Alpha,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Graphviz DOT source (`.gv`)
    Dot,
    /// Serialized graph model
    Json,
    /// PNG image (requires Graphviz)
    Png,
    /// SVG image (requires Graphviz)
    Svg,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Dot => "gv",
            OutputFormat::Json => "json",
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(cli: &Cli) -> Result<MinerConfig> {
    let mut config = match &cli.config {
        Some(path) => MinerConfig::from_path(path)
            .with_context(|| format!("Could not read configuration {}", path.display()))?,
        None => MinerConfig::default(),
    };
    if let Some(miner) = cli.miner {
        config.miner = miner.into();
    }
    if let Some(freq) = cli.min_activity_freq {
        config.min_activity_freq = freq;
    }
    if let Some(freq) = cli.min_transition_freq {
        config.min_transition_freq = freq;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<PathBuf> {
    let config = load_config(cli)?;
    let log = import_xes_file(&cli.log, &XESImportOptions::default())
        .map_err(MinerError::from)
        .with_context(|| format!("Could not import {}", cli.log.display()))?;
    info!(traces = log.len(), events = log.num_events(), "Imported event log");

    let graph = mine(&log, &config)?;

    fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("Could not create {}", cli.output_dir.display()))?;
    let base = cli.output_dir.join(config.output_base());
    write_graph(&graph, &base, cli.format)
}

fn output_path(base: &Path, format: OutputFormat) -> PathBuf {
    let mut file_name = base.as_os_str().to_owned();
    file_name.push(".");
    file_name.push(format.extension());
    PathBuf::from(file_name)
}

/// Writes `graph` to `{base}.{extension}` and returns that path
///
/// Images are accompanied by their DOT source (`{base}.gv`), which is written before rendering.
fn write_graph(
    graph: &flow_miner::GraphModel,
    base: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let path = output_path(base, format);
    match format {
        OutputFormat::Dot => fs::write(&path, graph_model_to_dot(graph)).map_err(MinerError::Io)?,
        OutputFormat::Json => {
            fs::write(&path, serde_json::to_string_pretty(graph)?).map_err(MinerError::Io)?
        }
        OutputFormat::Png | OutputFormat::Svg => {
            let dot_path = output_path(base, OutputFormat::Dot);
            fs::write(&dot_path, graph_model_to_dot(graph)).map_err(MinerError::Io)?;
            info!(path = %dot_path.display(), "Wrote DOT source");
            if format == OutputFormat::Png {
                export_graph_image_png(graph, &path).map_err(MinerError::Render)?
            } else {
                export_graph_image_svg(graph, &path).map_err(MinerError::Render)?
            }
        }
    }
    info!(path = %path.display(), "Wrote graph");
    Ok(path)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
