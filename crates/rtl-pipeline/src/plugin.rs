//! Build hook abstraction and the RTL plugin
//!
//! Hosts drive plugins through one contract: on emit, hand over the artifact
//! table and the mutable unit list, and await the completion signal.

use crate::artifact::ArtifactStore;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::ledger::UnitHashLedger;
use crate::minify::Minifier;
use crate::runtime;
use crate::scheduler::{Pipeline, PipelineReport};
use crate::transform::DirectionalTransform;
use crate::unit::Unit;

/// What a host passes to [`BuildPlugin::emit`].
pub struct Emit<'a, S: ?Sized> {
    pub assets: &'a S,
    pub units: &'a mut [Unit],
}

impl<'a, S: ?Sized> Emit<'a, S> {
    pub fn new(assets: &'a S, units: &'a mut [Unit]) -> Self {
        Self { assets, units }
    }
}

#[allow(async_fn_in_trait)]
pub trait BuildPlugin {
    /// Fired once per build (or incremental pass), after compilation and
    /// before anything is written to disk.
    async fn emit<S>(&mut self, build: Emit<'_, S>) -> Result<PipelineReport, PipelineError>
    where
        S: ArtifactStore + ?Sized;

    /// Fired while the host generates runtime bootstrap text. Returns the
    /// patched text, or `None` to leave it alone.
    fn runtime_template(&self, source: &str) -> Option<String> {
        let _ = source;
        None
    }
}

/// Emits an RTL variant of every stylesheet in the build.
pub struct RtlPlugin<T, M> {
    config: PipelineConfig,
    ledger: UnitHashLedger,
    transform: T,
    minifier: M,
}

impl<T, M> RtlPlugin<T, M>
where
    T: DirectionalTransform,
    M: Minifier,
{
    pub fn new(config: PipelineConfig, transform: T, minifier: M) -> Self {
        Self {
            config,
            ledger: UnitHashLedger::new(),
            transform,
            minifier,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &UnitHashLedger {
        &self.ledger
    }
}

impl<T, M> BuildPlugin for RtlPlugin<T, M>
where
    T: DirectionalTransform,
    M: Minifier,
{
    async fn emit<S>(&mut self, build: Emit<'_, S>) -> Result<PipelineReport, PipelineError>
    where
        S: ArtifactStore + ?Sized,
    {
        Pipeline::new(&self.config, &self.transform, &self.minifier)
            .run(build.units, build.assets, &mut self.ledger)
            .await
    }

    fn runtime_template(&self, source: &str) -> Option<String> {
        let flag = self.config.runtime()?;
        runtime::patch_loader(source, &flag.name)
    }
}
