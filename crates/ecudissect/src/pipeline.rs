//! End-to-end dissection: load, walk, persist, report.

use crate::artifacts::{ArtifactSink, ArtifactWriter};
use crate::config::DissectConfig;
use crate::layout;
use crate::memory::error::DumpResult;
use crate::memory::image::DumpImage;
use crate::report::{BlockReport, ReportFormat};
use blockfmt::{ChainWalker, RegionMap, SegmentPlan};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub blocks: usize,
    /// Artifact path per block, in chain order. Repeats when identifier codes collide.
    pub artifacts: Vec<PathBuf>,
}

/// Dissect the dump named in `config`, printing reports to stdout.
pub fn run(config: &DissectConfig) -> DumpResult<RunSummary> {
    info!("Loading dump {}", config.dump_path.display());
    let image = DumpImage::open(&config.dump_path)?;
    debug!("Mapped {} ({:#x} bytes)", image.path().display(), image.size());
    image.expect_size(layout::DUMP_SIZE)?;

    let regions = layout::region_map(image.into_source())?;
    for region in regions.iter() {
        debug!(
            "Region '{}': base={:#x} file offset={:#x} length={:#x}",
            region.name(),
            region.base_address(),
            region.source_offset(),
            region.len()
        );
    }

    let mut writer = ArtifactWriter::new(&config.out_dir)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = dissect(
        &regions,
        config.plan.clone(),
        config.entry_address,
        &mut writer,
        &mut out,
        config.format,
    )?;

    info!(
        "{} distinct artifact(s) in {}",
        writer.distinct_artifacts(),
        writer.out_dir().display()
    );
    Ok(summary)
}

/// Walk the chain and hand every block to the artifact sink and the report writer.
pub fn dissect(
    regions: &RegionMap,
    plan: SegmentPlan,
    entry_address: u32,
    sink: &mut dyn ArtifactSink,
    out: &mut dyn Write,
    format: ReportFormat,
) -> DumpResult<RunSummary> {
    info!(
        "Walking {} block(s) from {:#x} with plan {}",
        plan.total_blocks(),
        entry_address,
        plan
    );

    let mut walker = ChainWalker::new(regions, plan, entry_address)?;
    let mut artifacts = Vec::new();

    let blocks = walker.walk(|walked| -> DumpResult<()> {
        let block = &walked.block;
        let path = sink.persist(block.identifier_code, &block.payload)?;

        let report = BlockReport::new(&walked).with_artifact(path.display().to_string());
        debug!("{:?}", report);
        writeln!(out, "{}", report.render(format)?)?;

        artifacts.push(path);
        Ok(())
    })?;

    info!("Decoded {} block(s)", blocks);
    Ok(RunSummary { blocks, artifacts })
}
