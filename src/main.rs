use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cache_hierarchy_sim::config::HierarchyConfig;
use cache_hierarchy_sim::hierarchy::Hierarchy;
use cache_hierarchy_sim::trace::TraceReader;

/// Cache hierarchy simulator: L1, optional victim buffer, optional L2
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// L1 capacity in bytes
    l1_size: usize,

    /// L1 associativity
    l1_assoc: usize,

    /// Block size in bytes, shared by L1 and L2
    l1_block_size: usize,

    /// Victim buffer entries (0 disables the buffer)
    vc_num_blocks: usize,

    /// L2 capacity in bytes (0 disables L2)
    l2_size: usize,

    /// L2 associativity
    l2_assoc: usize,

    /// Trace file of `<r|w> <hex address>` lines
    trace_file: PathBuf,

    /// Print the statistics as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Dump the final contents of every cache
    #[arg(long)]
    contents: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = HierarchyConfig::from_dimensions(
        args.l1_size,
        args.l1_assoc,
        args.l1_block_size,
        args.vc_num_blocks,
        args.l2_size,
        args.l2_assoc,
    )?;
    let mut hierarchy = Hierarchy::new(&config)?;

    let file = File::open(&args.trace_file)
        .with_context(|| format!("failed to open trace file {}", args.trace_file.display()))?;
    let processed = hierarchy.run(TraceReader::new(BufReader::new(file)))?;
    info!(processed, "simulation complete");

    let stats = hierarchy.statistics();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    config.print_config(&args.trace_file.display().to_string());
    if args.contents {
        println!("===== L1 contents =====");
        hierarchy.l1().print_contents();
        if let Some(victim) = hierarchy.victim() {
            println!("===== Victim buffer contents =====");
            victim.print_contents();
        }
        if let Some(l2) = hierarchy.l2() {
            println!("===== L2 contents =====");
            l2.print_contents();
        }
    }
    stats.print_stats();
    Ok(())
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout carries the report
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
