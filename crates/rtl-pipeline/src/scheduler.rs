//! Pipeline scheduler
//!
//! Selects the units whose content hash changed since the previous pass,
//! processes at most [`MAX_CONCURRENT_UNITS`] of them at a time, and appends
//! each unit's new RTL assets to its manifest once its writes have landed.
//!
//! Everything runs cooperatively on the caller's task: units interleave at
//! the transform and minify suspension points, never in parallel.

use std::collections::HashSet;

use futures::StreamExt;
use futures::stream;
use tracing::{debug, info};

use crate::artifact::ArtifactStore;
use crate::config::PipelineConfig;
use crate::error::{ConfigWarning, Failure, PipelineError};
use crate::ledger::UnitHashLedger;
use crate::minify::Minifier;
use crate::processor::{UnitProcessor, UnitReport};
use crate::transform::DirectionalTransform;
use crate::unit::{Unit, UnitId, UnitMeta};

/// Upper bound on units processed simultaneously.
pub const MAX_CONCURRENT_UNITS: usize = 5;

/// Summary of one pipeline pass.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Units whose hash changed, in completion order
    pub processed: Vec<UnitId>,
    /// Units skipped because their hash matched the ledger
    pub skipped: Vec<UnitId>,
    /// Every RTL asset written
    pub written: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
    pub failures: Vec<Failure>,
}

impl PipelineReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, unit: UnitReport) {
        self.processed.push(unit.unit);
        self.written.extend(unit.written);
        self.warnings.extend(unit.warnings);
        self.failures.extend(unit.failures);
    }
}

struct UnitJob {
    index: usize,
    meta: UnitMeta,
    files: Vec<String>,
}

/// The collaborators one pass runs with.
pub struct Pipeline<'a, T, M> {
    config: &'a PipelineConfig,
    transform: &'a T,
    minifier: &'a M,
}

impl<'a, T, M> Pipeline<'a, T, M>
where
    T: DirectionalTransform,
    M: Minifier,
{
    pub fn new(config: &'a PipelineConfig, transform: &'a T, minifier: &'a M) -> Self {
        Self {
            config,
            transform,
            minifier,
        }
    }

    /// Run one pass over `units`.
    ///
    /// Resolves after every selected unit settled. Per-asset failures never
    /// stop sibling units; they are gathered into [`PipelineError::AssetsFailed`].
    pub async fn run<S>(
        &self,
        units: &mut [Unit],
        assets: &S,
        ledger: &mut UnitHashLedger,
    ) -> Result<PipelineReport, PipelineError>
    where
        S: ArtifactStore + ?Sized,
    {
        let mut report = PipelineReport::default();

        // RTL outputs of earlier passes are neither sources nor reserved names
        let originals = |files: &[String], ledger: &UnitHashLedger| -> Vec<String> {
            files
                .iter()
                .filter(|file| !ledger.is_output(file))
                .cloned()
                .collect()
        };
        let reserved: HashSet<String> = units
            .iter()
            .flat_map(|unit| originals(&unit.files, ledger))
            .collect();

        let mut jobs = Vec::new();
        for (index, unit) in units.iter().enumerate() {
            if ledger.observe(&unit.id, &unit.hash) {
                jobs.push(UnitJob {
                    index,
                    meta: unit.meta(),
                    files: originals(&unit.files, ledger),
                });
            } else {
                debug!(unit = %unit.id, "unchanged since last pass");
                report.skipped.push(unit.id.clone());
            }
        }

        let processor = UnitProcessor::new(self.config, self.transform, self.minifier, assets)
            .with_reserved(reserved);
        let processor = &processor;
        let mut settled = stream::iter(jobs)
            .map(move |job| async move {
                let report = processor.run(&job.meta, &job.files).await;
                (job.index, report)
            })
            .buffer_unordered(MAX_CONCURRENT_UNITS);

        while let Some((index, unit_report)) = settled.next().await {
            for name in &unit_report.written {
                ledger.record_output(name.as_str());
            }
            units[index].files.extend(unit_report.written.iter().cloned());
            report.absorb(unit_report);
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            written = report.written.len(),
            warnings = report.warnings.len(),
            failures = report.failures.len(),
            "rtl pass finished"
        );

        if report.is_ok() {
            Ok(report)
        } else {
            Err(PipelineError::AssetsFailed(Box::new(report)))
        }
    }
}
