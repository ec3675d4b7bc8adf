//! `pool`: combine vessel balances from a persisted fleet report.

use std::path::PathBuf;

use anyhow::{Context, Result};

use navigator_cli::output::{render_pool, OutputFormat};
use navigator_lib::{pool, ArtifactStore};

#[derive(Debug)]
pub struct PoolArgs {
    pub artifact_dir: PathBuf,
    pub ship_ids: Vec<String>,
    pub format: OutputFormat,
}

/// Handle the pool subcommand.
pub fn handle_pool(args: &PoolArgs) -> Result<()> {
    let rows = ArtifactStore::new(&args.artifact_dir)
        .load_report()
        .with_context(|| {
            format!(
                "failed to load the fleet report from {}",
                args.artifact_dir.display()
            )
        })?;

    let result = pool(&rows, &args.ship_ids).context("cannot pool the selected vessels")?;
    tracing::info!(
        members = result.members.len(),
        net_balance = result.net_balance,
        compliant = result.compliant,
        "pool evaluated"
    );

    println!("{}", render_pool(&result, args.format)?);
    Ok(())
}
