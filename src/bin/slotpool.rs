//! slotpool command-line tool
//!
//! Sizes slot pools for a workload and drives a pool under parallel load.
//!
//! # Examples
//!
//! ```bash
//! # Recommended capacity for 1000 ids/s held 3 s on average
//! slotpool size --throughput 1000 --hold-ms 3000
//!
//! # Hammer a 64-slot pool from 8 workers
//! slotpool simulate --capacity 64 --workers 8 --rounds 10000
//!
//! # Same, with the pool loaded from a config file and JSON output
//! slotpool simulate --config pool.toml --json
//! ```

use clap::{Args, Parser, Subcommand};
use slotpool::{run_simulation, PoolConfig, SlotPool};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// slotpool - reusable slot identifier allocator
#[derive(Parser, Debug)]
#[command(name = "slotpool")]
#[command(version = slotpool::VERSION)]
#[command(about = "Size and exercise fixed-capacity slot pools", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Log directory path
    #[arg(long, global = true, default_value = "logs", env = "SLOTPOOL_LOG_DIR")]
    log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recommend a pool capacity for a workload
    Size(SizeArgs),

    /// Drive a pool from parallel workers and check for duplicate ids
    Simulate(SimulateArgs),

    /// Show version
    Version,
}

/// Sizing arguments
#[derive(Args, Debug)]
struct SizeArgs {
    /// Slots acquired per second
    #[arg(short, long)]
    throughput: f64,

    /// Average time a slot is held, in milliseconds
    #[arg(long)]
    hold_ms: u64,
}

/// Simulation arguments
#[derive(Args, Debug)]
struct SimulateArgs {
    /// Pool capacity (ignored when --config is given)
    #[arg(short, long, default_value_t = PoolConfig::DEFAULT_CAPACITY, env = "SLOTPOOL_CAPACITY")]
    capacity: usize,

    /// TOML pool configuration file
    #[arg(long, env = "SLOTPOOL_CONFIG")]
    config: Option<PathBuf>,

    /// Number of worker threads (at least 1)
    #[arg(short, long, default_value = "4")]
    workers: NonZeroUsize,

    /// Acquire/release cycles per worker
    #[arg(short, long, default_value = "10000")]
    rounds: u64,

    /// Slots each worker holds at once per cycle
    #[arg(short, long, default_value = "1")]
    batch: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    match cli.command {
        Commands::Size(args) => size_command(args),
        Commands::Simulate(args) => simulate_command(args),
        Commands::Version => {
            println!("slotpool {}", slotpool::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with rolling files and console output
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cli.log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &cli.log_dir, "slotpool.log");

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

/// Size command - print the recommended capacity and its config
fn size_command(args: SizeArgs) -> anyhow::Result<()> {
    let hold = Duration::from_millis(args.hold_ms);
    let config = PoolConfig::for_workload(args.throughput, hold);
    info!(
        throughput = args.throughput,
        hold_ms = args.hold_ms,
        capacity = config.capacity,
        "Computed pool size"
    );

    println!("Recommended capacity: {}", config.capacity);
    println!("───────────────────────────────");
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Simulate command - run acquire/release cycles on a rayon pool
fn simulate_command(args: SimulateArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => PoolConfig::from_file(path)?,
        None => PoolConfig::new(args.capacity),
    };
    let pool = SlotPool::from_config(&config)?;
    let report = run_simulation(&pool, args.workers, args.rounds, args.batch)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Simulation ({} workers × {} rounds)", report.workers, report.rounds);
        println!("───────────────────────────────");
        println!("  Acquired:   {}", report.acquired);
        println!("  Exhausted:  {}", report.exhausted);
        println!("  Duplicates: {}", report.duplicates);
        println!("  Elapsed:    {} ms", report.elapsed_ms);
        println!(
            "  Pool:       {}/{} allocated, cursor at {}",
            report.stats.allocated, report.stats.capacity, report.stats.cursor
        );
    }

    Ok(())
}
