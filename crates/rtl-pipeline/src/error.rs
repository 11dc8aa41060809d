//! Error types for the RTL pipeline.

use std::fmt;
use std::time::Duration;

use crate::diff::DiffError;
use crate::unit::UnitId;

/// Failure reported by a directional rewrite engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransformError {
    /// The engine could not make sense of the stylesheet.
    #[error("failed to parse stylesheet at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// Any other engine-specific failure.
    #[error("rewrite engine failed: {0}")]
    Engine(String),
}

/// Failure reported by a minifier.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MinifyError {
    /// The minifier rejected the stylesheet.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Any other minifier-specific failure.
    #[error("minifier failed: {0}")]
    Engine(String),
}

/// The pipeline stage at which an asset failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StageError {
    #[error("asset is listed by its unit but missing from the artifact table")]
    MissingAsset,

    #[error("directional transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("diff failed: {0}")]
    Diff(#[from] DiffError),

    #[error("minifying the original failed: {0}")]
    MinifyOriginal(MinifyError),

    #[error("minifying the RTL variant failed: {0}")]
    MinifyMirrored(MinifyError),

    /// The derived name belongs to an original of this build, or another
    /// asset already wrote it during this pass.
    #[error("derived name `{name}` is already taken in this build")]
    Collision { name: String },

    #[error("unit did not finish within {0:?}")]
    Timeout(Duration),
}

/// An error local to one asset (or, for timeouts, one unit).
#[derive(Debug, Clone)]
pub struct Failure {
    pub unit: UnitId,
    /// `None` when the whole unit failed
    pub asset: Option<String>,
    pub error: StageError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.asset {
            Some(asset) => write!(f, "unit {}, asset `{}`: {}", self.unit, asset, self.error),
            None => write!(f, "unit {}: {}", self.unit, self.error),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Configuration problems detected while running. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    /// The filename rule produced the original name; writing would clobber the source.
    #[error("filename rule left `{asset}` unchanged; skipped its RTL output")]
    FilenameUnchanged { asset: String },
}

/// Aggregate failure of a pipeline run, raised after every unit settled.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{} asset(s) failed to produce RTL output", .0.failures.len())]
    AssetsFailed(Box<crate::scheduler::PipelineReport>),
}

impl PipelineError {
    /// The report of the run that failed. Successful writes are still listed.
    pub fn report(&self) -> &crate::scheduler::PipelineReport {
        match self {
            PipelineError::AssetsFailed(report) => report,
        }
    }
}
