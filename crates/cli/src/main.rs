//! Memory-hierarchy assembler CLI.
//!
//! This binary assembles a system from configuration and runs it to termination. It performs:
//! 1. **Run:** Load a JSON config (or defaults), apply overrides, probe the workload binary,
//!    build and finalize the graph, then instantiate and simulate it on the chosen engine.
//! 2. **Dump:** Build and finalize the graph and write it as JSON without simulating.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use memhier_core::config::{CacheConfig, Config};
use memhier_core::sim::{DryRunEngine, Engine, ExternalEngine, SeWorkload, Simulation, WorkloadArg};
use memhier_core::{SimError, build_system};

#[derive(Parser, Debug)]
#[command(
    name = "memhier",
    author,
    version,
    about = "Memory-hierarchy topology assembler",
    long_about = "Assemble a CPU / L1 / L2 / L3 / DRAM system graph and run it on a simulation engine.\n\nExamples:\n  memhier run --binary hello\n  memhier run config.json --arg -ns --arg 16 --levels 1\n  memhier run --engine external --engine-cmd ./engine\n  memhier dump config.json -o graph.json"
)]
struct Cli {
    /// Log filter (overrides `RUST_LOG`), e.g. `debug` or `memhier_core=trace`.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the system and simulate it.
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Engine used to run the graph.
        #[arg(long, value_enum, default_value_t = EngineKind::DryRun)]
        engine: EngineKind,

        /// Simulator program for the external engine.
        #[arg(long, required_if_eq("engine", "external"))]
        engine_cmd: Option<PathBuf>,

        /// Where the external engine's config dump is written.
        #[arg(long, default_value = "config.json")]
        dump_config: PathBuf,

        /// Skip probing the workload binary before assembly.
        #[arg(long)]
        no_probe: bool,
    },

    /// Build and finalize the system, then write the graph as JSON.
    Dump {
        #[command(flatten)]
        overrides: Overrides,

        /// Output path; stdout if omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct Overrides {
    /// JSON configuration file; defaults are used if omitted.
    config: Option<PathBuf>,

    /// Workload binary.
    #[arg(short, long)]
    binary: Option<PathBuf>,

    /// Workload argument, repeatable; integers stay integers.
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Physical memory size (e.g. `512MB`).
    #[arg(long)]
    mem_size: Option<String>,

    /// System clock (e.g. `1GHz`).
    #[arg(long)]
    clock: Option<String>,

    /// CPU model (`TimingSimple`, `AtomicSimple`, `Minor`, `O3`).
    #[arg(long)]
    cpu: Option<String>,

    /// Number of shared cache levels below L1.
    #[arg(long)]
    levels: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// Built-in engine that exits immediately.
    DryRun,
    /// External simulator program.
    External,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let result = match cli.command {
        Commands::Run {
            overrides,
            engine,
            engine_cmd,
            dump_config,
            no_probe,
        } => cmd_run(&overrides, engine, engine_cmd, dump_config, no_probe),
        Commands::Dump { overrides, output } => cmd_dump(&overrides, output.as_deref()),
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration and applies command-line overrides.
fn load_config(overrides: &Overrides) -> Result<Config, SimError> {
    let mut config = match &overrides.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(binary) = &overrides.binary {
        config.workload.binary.clone_from(binary);
    }
    if !overrides.args.is_empty() {
        config.workload.args = overrides.args.iter().map(|a| parse_arg(a)).collect();
    }
    if let Some(size) = &overrides.mem_size {
        config.system.mem_size.clone_from(size);
    }
    if let Some(clock) = &overrides.clock {
        config.system.clock.clone_from(clock);
    }
    if let Some(model) = &overrides.cpu {
        config.cpu.model = serde_json::from_value(Value::String(model.clone()))
            .map_err(memhier_core::ConfigError::from)?;
    }
    if let Some(levels) = overrides.levels {
        config.cache.levels.resize_with(levels, CacheConfig::l3);
    }
    Ok(config)
}

fn parse_arg(arg: &str) -> WorkloadArg {
    arg.parse::<i64>()
        .map_or_else(|_| WorkloadArg::from(arg), WorkloadArg::Int)
}

fn run<E: Engine>(engine: E, config: &Config) -> Result<(), SimError> {
    let graph = build_system(config)?;
    let mut sim = Simulation::new(engine, graph);
    sim.instantiate()?;

    println!("Beginning simulation!");
    let event = sim.simulate()?;
    println!("{}", sim.report(&event));
    Ok(())
}

fn cmd_run(
    overrides: &Overrides,
    engine: EngineKind,
    engine_cmd: Option<PathBuf>,
    dump_config: PathBuf,
    no_probe: bool,
) -> Result<(), SimError> {
    let config = load_config(overrides)?;
    if !no_probe {
        let workload = SeWorkload::init_compatible(&config.workload.binary, config.cpu.isa)?;
        info!(binary = %workload.binary().display(), entry = workload.entry(), "workload ok");
    }

    match (engine, engine_cmd) {
        (EngineKind::External, Some(program)) => {
            run(ExternalEngine::new(program, dump_config), &config)
        }
        _ => run(DryRunEngine::new(), &config),
    }
}

fn cmd_dump(overrides: &Overrides, output: Option<&Path>) -> Result<(), SimError> {
    let config = load_config(overrides)?;
    let graph = build_system(&config)?;
    let json = graph
        .to_json()
        .map_err(memhier_core::ConfigError::from)?;
    match output {
        Some(path) => std::fs::write(path, json).map_err(|source| memhier_core::ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?,
        None => println!("{json}"),
    }
    Ok(())
}
