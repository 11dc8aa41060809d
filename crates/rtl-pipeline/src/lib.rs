//! RTL stylesheet pipeline
//!
//! Produces a mirrored, right-to-left variant of every stylesheet a build
//! emits, next to the original. Optionally reduces the variant to the
//! declarations that changed, minifies both, and names the result through a
//! small token grammar.
//!
//! The directional rewrite engine and the minifier are collaborators behind
//! [`DirectionalTransform`] and [`Minifier`]; the host build is reached only
//! through [`ArtifactStore`] and [`Unit`].

pub mod artifact;
pub mod config;
pub mod diff;
pub mod error;
pub mod filename;
pub mod ledger;
pub mod minify;
pub mod plugin;
pub mod processor;
pub mod runtime;
pub mod scheduler;
pub mod transform;
pub mod unit;

pub use artifact::{ArtifactStore, Asset, AssetTable, Source};
pub use config::{
    FilenameRule, MinifyConfig, MinifyOptions, PipelineConfig, PipelineConfigBuilder, RuntimeFlag,
    TransformOptions,
};
pub use diff::DiffError;
pub use error::{ConfigWarning, Failure, MinifyError, PipelineError, StageError, TransformError};
pub use ledger::UnitHashLedger;
pub use minify::Minifier;
pub use plugin::{BuildPlugin, Emit, RtlPlugin};
pub use processor::{UnitProcessor, UnitReport};
pub use scheduler::{MAX_CONCURRENT_UNITS, Pipeline, PipelineReport};
pub use transform::{DirectionalTransform, TransformExtension};
pub use unit::{Unit, UnitId, UnitMeta};
