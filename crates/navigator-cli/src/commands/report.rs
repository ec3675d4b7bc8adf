//! `report`: run the compliance pass over a voyage CSV.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use navigator_cli::output::{render_report, OutputFormat};
use navigator_lib::{run_compliance_pass, ArtifactStore, EngineConfig, VoyageLog};

/// Arguments accepted by the report subcommand, after clap parsing.
#[derive(Debug)]
pub struct ReportArgs {
    pub voyages: PathBuf,
    pub out_dir: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Handle the report subcommand.
pub fn handle_report(args: &ReportArgs, config: &EngineConfig) -> Result<()> {
    let log = load_voyages(&args.voyages)?;
    if log.voyages.is_empty() {
        anyhow::bail!(
            "no usable voyages in {} ({} rows skipped)",
            args.voyages.display(),
            log.rejected.len()
        );
    }

    let pass = run_compliance_pass(&log.voyages, config)
        .context("failed to derive the fleet compliance target")?;

    if let Some(dir) = &args.out_dir {
        ArtifactStore::new(dir)
            .save(&pass)
            .with_context(|| format!("failed to write artifacts to {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), "artifacts saved");
    }

    println!("{}", render_report(&pass, &log.rejected, args.format)?);
    Ok(())
}

fn load_voyages(path: &Path) -> Result<VoyageLog> {
    VoyageLog::from_path(path)
        .with_context(|| format!("failed to load voyages from {}", path.display()))
}
