//! rete-topology
//!
//! Command-line interface: compile rule files and print the wired topology.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use rete_topology::{
    CompiledNetwork, FeedbackGrouping, LogLevel, OutputFormat, ReteConfig, RuleParser,
    TopologyCompiler, TopologyError, TopologyGraph, Wiring, WiringOptions,
};

#[derive(Parser)]
#[command(name = "rete-topology")]
#[command(author = "rete-topology authors")]
#[command(version = "0.1.0")]
#[command(about = "Compile forward-chaining rules into a dataflow topology", long_about = None)]
struct Cli {
    /// Rule files to compile (stdin when none are given)
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (overrides the default search path)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Deployment profile: local, cluster, or one defined in the config
    #[arg(short, long)]
    profile: Option<String>,

    /// Topology name
    #[arg(long)]
    name: Option<String>,

    /// Raw-fact source identifier
    #[arg(long)]
    source: Option<String>,

    /// Axiom source identifier
    #[arg(long = "axiom-source")]
    axiom_source: Option<String>,

    /// Number of workers requested from the engine
    #[arg(long)]
    workers: Option<usize>,

    /// Default operator parallelism
    #[arg(long)]
    parallelism: Option<usize>,

    /// Upper bound on any operator's parallelism
    #[arg(long = "max-parallelism")]
    max_parallelism: Option<usize>,

    /// Grouping on the conflict set → filter feedback edges
    #[arg(long, value_enum)]
    feedback: Option<Feedback>,

    /// Print the compile report as JSON on stderr
    #[arg(long)]
    report: bool,

    /// Write a default configuration file (to --output or stdout) and exit
    #[arg(long = "init-config")]
    init_config: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long = "print-config")]
    print_config: bool,

    /// List available deployment profiles and exit
    #[arg(long = "list-profiles")]
    list_profiles: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable operator list
    Summary,
    /// Serialized topology graph
    Json,
    /// Graphviz
    Dot,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Summary => OutputFormat::Summary,
            Format::Json => OutputFormat::Json,
            Format::Dot => OutputFormat::Dot,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Feedback {
    Shuffle,
    All,
}

impl From<Feedback> for FeedbackGrouping {
    fn from(feedback: Feedback) -> Self {
        match feedback {
            Feedback::Shuffle => FeedbackGrouping::Shuffle,
            Feedback::All => FeedbackGrouping::All,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.report;

    if let Err(err) = run(cli) {
        let topology_err = err.downcast_ref::<TopologyError>();
        match topology_err {
            Some(e) if json_errors => eprintln!("{}", e.to_json()),
            _ => eprintln!("error: {:#}", err),
        }
        process::exit(topology_err.map(|e| e.code.exit_status()).unwrap_or(1));
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        return write_output(&cli, ReteConfig::default_config_content());
    }

    let config = load_config(&cli).map_err(TopologyError::from)?;
    init_tracing(&cli, &config);

    if cli.print_config {
        let toml = config.to_toml().map_err(TopologyError::from)?;
        return write_output(&cli, &toml);
    }

    if cli.list_profiles {
        for (name, description) in config.available_profiles() {
            println!("{:<12} {}", name, description);
        }
        return Ok(());
    }

    let rules = {
        let mut parser = RuleParser::with_prefixes(
            config.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str())),
        );
        let mut rules = Vec::new();
        if cli.inputs.is_empty() {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read from stdin")?;
            rules.extend(parser.parse_document(&content).map_err(TopologyError::from)?);
        }
        for path in &cli.inputs {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            let parsed = parser
                .parse_document(&content)
                .map_err(|e| TopologyError::from(e).at(path.display().to_string()))?;
            debug!(file = %path.display(), rules = parsed.len(), "parsed rule file");
            rules.extend(parsed);
        }
        rules
    };
    info!(rules = rules.len(), "loaded rules");

    let network = TopologyCompiler::from_config(&config).compile(&rules)?;
    report(&cli, &network)?;

    let mut graph = TopologyGraph::from_config(&config);
    Wiring::new(WiringOptions::from_config(&config)).wire(&network, &mut graph)?;

    let rendered = match config.general.format {
        OutputFormat::Summary => graph.summary(),
        OutputFormat::Json => graph.to_json()? + "\n",
        OutputFormat::Dot => graph.to_dot(),
    };

    write_output(&cli, &rendered)
}

fn write_output(cli: &Cli, content: &str) -> Result<()> {
    match &cli.output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write output: {}", path.display()))?,
        None => io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?,
    }
    Ok(())
}

/// Config file, then environment, then profile, then command-line flags
fn load_config(cli: &Cli) -> Result<ReteConfig, rete_topology::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = ReteConfig::load_from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => ReteConfig::load()?,
    };

    if let Some(profile) = &cli.profile {
        config.apply_profile(profile)?;
    }

    if let Some(format) = cli.format {
        config.general.format = format.into();
    }
    if let Some(name) = &cli.name {
        config.topology.name = name.clone();
    }
    if let Some(source) = &cli.source {
        config.topology.source = source.clone();
    }
    if let Some(source) = &cli.axiom_source {
        config.topology.axiom_source = source.clone();
    }
    if let Some(workers) = cli.workers {
        config.topology.workers = workers;
    }
    if let Some(n) = cli.parallelism {
        config.parallelism.default = n;
    }
    if let Some(n) = cli.max_parallelism {
        config.topology.max_parallelism = n;
    }
    if let Some(feedback) = cli.feedback {
        config.topology.feedback = feedback.into();
    }
    if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    } else if cli.verbose > 1 {
        config.general.log_level = LogLevel::Debug;
    } else if cli.verbose == 1 {
        config.general.log_level = LogLevel::Verbose;
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(cli: &Cli, config: &ReteConfig) {
    let level = if cli.verbose > 2 {
        tracing::Level::TRACE
    } else {
        config.general.log_level.tracing_level()
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn report(cli: &Cli, network: &CompiledNetwork) -> Result<()> {
    let report = network.report();
    if cli.report {
        eprintln!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.rule, skipped.error);
    }
    Ok(())
}
