//! ecudissect: extract firmware blocks from engine controller flash dumps.
//!
//! Reads an 8 MiB dump of the internal and external flash, walks the block
//! chain starting at the alternate bootloader, writes every block's payload
//! to `<identifier>.bin` and prints one diagnostic record per block.

mod artifacts;
mod config;
mod layout;
mod memory;
mod pipeline;
mod report;

use blockfmt::SegmentPlan;
use clap::Parser;
use config::{parse_address, DissectConfig};
use report::ReportFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecudissect")]
#[command(about = "Walk the block chain of an engine controller flash dump and extract each block", long_about = None)]
struct Cli {
    /// Path to the 8 MiB flash dump
    dump: PathBuf,

    /// Directory the extracted blocks are written to
    #[arg(long, short, default_value = ".")]
    out_dir: PathBuf,

    /// Segment plan as region:count pairs (default: pmu0:5,pmu1:1,external:2)
    #[arg(long)]
    plan: Option<SegmentPlan>,

    /// Address of the first block header (default: 0x80018000)
    #[arg(long, value_parser = parse_address)]
    entry: Option<u32>,

    /// Report format printed on stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    format: ReportFormat,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries reports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = DissectConfig::new(cli.dump);
    config.out_dir = cli.out_dir;
    config.format = cli.format;
    if let Some(plan) = cli.plan {
        config.plan = plan;
    }
    if let Some(entry) = cli.entry {
        config.entry_address = entry;
    }

    let summary = pipeline::run(&config)
        .inspect_err(|e| tracing::error!("Dissection failed: {}", e))?;

    tracing::info!(
        "Extracted {} block(s) into {}",
        summary.blocks,
        config.out_dir.display()
    );
    Ok(())
}
