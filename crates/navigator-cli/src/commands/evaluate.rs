//! `evaluate`: score one voyage with the built-in predictor.

use std::path::PathBuf;

use anyhow::{Context, Result};

use navigator_cli::output::{render_evaluation, OutputFormat};
use navigator_lib::{
    load_target_file, CompliancePredictor, EmissionFactorPredictor, EngineConfig,
    PredictionView, RegulatoryTarget, TargetPolicy, TargetResolution, TargetSource,
    VoyageFeatures,
};

#[derive(Debug)]
pub struct EvaluateArgs {
    pub features: VoyageFeatures,
    pub target_file: Option<PathBuf>,
    pub target: Option<f64>,
    pub format: OutputFormat,
}

/// Handle the evaluate subcommand.
pub fn handle_evaluate(args: &EvaluateArgs, config: &EngineConfig) -> Result<()> {
    let resolution = resolve_target(args, config)?;

    let engine =
        CompliancePredictor::new(EmissionFactorPredictor::new()).with_formula(config.formula);
    let decision = engine
        .evaluate(&args.features, &resolution.target)
        .context("failed to evaluate voyage")?;

    let view = PredictionView::from(&decision);
    println!(
        "{}",
        render_evaluation(&view, config.formula, resolution.source, args.format)?
    );
    Ok(())
}

/// An explicit `--target` wins over `--target-file`; with neither, the
/// configured fallback is used.
fn resolve_target(args: &EvaluateArgs, config: &EngineConfig) -> Result<TargetResolution> {
    if let Some(value) = args.target {
        return Ok(TargetResolution {
            target: RegulatoryTarget::fixed(value, config.formula)
                .context("invalid --target value")?,
            source: TargetSource::Explicit,
        });
    }

    if let Some(path) = &args.target_file {
        let artifact = load_target_file(path)
            .with_context(|| format!("failed to load target from {}", path.display()))?;
        if artifact.target.formula != config.formula {
            anyhow::bail!(
                "target in {} was derived with the {} formula, not {}",
                path.display(),
                artifact.target.formula,
                config.formula
            );
        }
        return Ok(TargetResolution {
            target: artifact.target,
            source: TargetSource::Loaded,
        });
    }

    TargetPolicy::from_config(config)
        .fallback_target()
        .context("invalid fallback target")
}
