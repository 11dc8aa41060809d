//! Per-unit processing
//!
//! For each stylesheet of a unit: mirror it (when eligible), reduce it to a
//! diff (when configured), derive its name, then minify both variants (when
//! enabled) and write the results into the artifact table.

use std::collections::HashSet;

use dashmap::DashSet;
use futures::future::OptionFuture;
use tracing::{debug, warn};

use crate::artifact::{ArtifactStore, Source};
use crate::config::PipelineConfig;
use crate::diff;
use crate::error::{ConfigWarning, Failure, StageError};
use crate::filename;
use crate::minify::Minifier;
use crate::transform::{self, DirectionalTransform};
use crate::unit::{UnitId, UnitMeta, is_stylesheet};

/// Outcome of processing one unit.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub unit: UnitId,
    /// RTL asset names written, in the order their sources appear in the unit
    pub written: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
    pub failures: Vec<Failure>,
}

impl UnitReport {
    fn new(unit: UnitId) -> Self {
        Self {
            unit,
            written: Vec::new(),
            warnings: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, asset: &str, error: StageError) {
        warn!(unit = %self.unit, asset, %error, "asset failed");
        self.failures.push(Failure {
            unit: self.unit.clone(),
            asset: Some(asset.to_string()),
            error,
        });
    }
}

/// An RTL variant ready to be written.
struct Mirrored {
    name: String,
    content: String,
}

/// Processes units against one artifact table during one pass.
pub struct UnitProcessor<'a, T, M, S: ?Sized> {
    config: &'a PipelineConfig,
    transform: &'a T,
    minifier: &'a M,
    assets: &'a S,
    /// Original names of the build; never a valid RTL name
    reserved: HashSet<String>,
    /// Derived names written so far in this pass
    claimed: DashSet<String>,
}

impl<'a, T, M, S> UnitProcessor<'a, T, M, S>
where
    T: DirectionalTransform,
    M: Minifier,
    S: ArtifactStore + ?Sized,
{
    pub fn new(config: &'a PipelineConfig, transform: &'a T, minifier: &'a M, assets: &'a S) -> Self {
        Self {
            config,
            transform,
            minifier,
            assets,
            reserved: HashSet::new(),
            claimed: DashSet::new(),
        }
    }

    /// Names no RTL output may take, typically every member file of every unit.
    pub fn with_reserved(mut self, reserved: HashSet<String>) -> Self {
        self.reserved = reserved;
        self
    }

    /// Process every stylesheet among `files`, honouring the unit timeout.
    pub async fn run(&self, unit: &UnitMeta, files: &[String]) -> UnitReport {
        let work = self.process(unit, files);
        let Some(limit) = self.config.unit_timeout() else {
            return work.await;
        };
        match tokio::time::timeout(limit, work).await {
            Ok(report) => report,
            Err(_) => {
                warn!(unit = %unit.id, ?limit, "unit timed out");
                let mut report = UnitReport::new(unit.id.clone());
                report.failures.push(Failure {
                    unit: unit.id.clone(),
                    asset: None,
                    error: StageError::Timeout(limit),
                });
                report
            }
        }
    }

    /// Process every stylesheet among `files`; resolves once all writes landed.
    pub async fn process(&self, unit: &UnitMeta, files: &[String]) -> UnitReport {
        let mut report = UnitReport::new(unit.id.clone());
        for asset in files.iter().filter(|name| is_stylesheet(name)) {
            self.process_asset(unit, asset, &mut report).await;
        }
        debug!(unit = %unit.id, written = report.written.len(), "unit processed");
        report
    }

    async fn process_asset(&self, unit: &UnitMeta, asset: &str, report: &mut UnitReport) {
        let Some(original) = self.assets.get(asset) else {
            report.fail(asset, StageError::MissingAsset);
            return;
        };
        let original = original.text();

        let mirrored = if self.config.is_eligible(asset) {
            self.mirror(unit, asset, &original, report).await
        } else {
            debug!(asset, "not selected for RTL output");
            None
        };

        let Some(options) = self.config.minify().options() else {
            if let Some(mirrored) = mirrored {
                self.write_mirrored(asset, mirrored, report);
            }
            return;
        };

        let original_min = self.minifier.minify(&original, options);
        let mirrored_min: OptionFuture<_> = mirrored
            .as_ref()
            .map(|m| self.minifier.minify(&m.content, options))
            .into();
        let (original_min, mirrored_min) = futures::join!(original_min, mirrored_min);

        match original_min {
            Ok(css) => self.assets.set(asset, Source::from(css)),
            Err(error) => report.fail(asset, StageError::MinifyOriginal(error)),
        }

        if let (Some(mirrored), Some(result)) = (mirrored, mirrored_min) {
            match result {
                Ok(css) => self.write_mirrored(
                    asset,
                    Mirrored {
                        name: mirrored.name,
                        content: css,
                    },
                    report,
                ),
                Err(error) => report.fail(asset, StageError::MinifyMirrored(error)),
            }
        }
    }

    /// Produce the RTL text and its name, or record why there is none.
    async fn mirror(
        &self,
        unit: &UnitMeta,
        asset: &str,
        original: &str,
        report: &mut UnitReport,
    ) -> Option<Mirrored> {
        let rtl = match transform::mirror(self.transform, original, self.config).await {
            Ok(rtl) => rtl,
            Err(error) => {
                report.fail(asset, StageError::Transform(error));
                return None;
            }
        };

        let content = if self.config.diff_only() {
            match diff::diff(original, &rtl) {
                Ok(diff) => diff,
                Err(error) => {
                    report.fail(asset, StageError::Diff(error));
                    return None;
                }
            }
        } else {
            rtl
        };

        let name = filename::derive(asset, unit, &content, self.config.filename());
        if name == asset {
            let warning = ConfigWarning::FilenameUnchanged {
                asset: asset.to_string(),
            };
            warn!(unit = %unit.id, "{warning}");
            report.warnings.push(warning);
            return None;
        }

        if self.reserved.contains(&name) {
            report.fail(asset, StageError::Collision { name });
            return None;
        }

        debug!(asset, rtl = %name, "mirrored");
        Some(Mirrored { name, content })
    }

    /// Write once per name and pass; the first writer keeps the name.
    fn write_mirrored(&self, asset: &str, mirrored: Mirrored, report: &mut UnitReport) {
        if !self.claimed.insert(mirrored.name.clone()) {
            report.fail(asset, StageError::Collision { name: mirrored.name });
            return;
        }
        self.assets.set(&mirrored.name, Source::from(mirrored.content));
        report.written.push(mirrored.name);
    }
}
