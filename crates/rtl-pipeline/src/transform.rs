//! Directional transform adapter
//!
//! The rewrite engine itself lives behind [`DirectionalTransform`]; the
//! pipeline only forwards the configured options and extension list.

use std::sync::Arc;

use crate::config::{PipelineConfig, TransformOptions};
use crate::error::TransformError;

/// A pluggable rewrite applied by the engine before its built-in rules.
///
/// Extensions run in configuration order; the first one returning a
/// replacement wins for that declaration or selector.
pub trait TransformExtension: Send + Sync {
    fn name(&self) -> &str;

    /// Replacement `(property, value)` for a declaration, if this extension handles it.
    fn declaration(&self, property: &str, value: &str) -> Option<(String, String)> {
        let _ = (property, value);
        None
    }

    /// Replacement selector text, if this extension handles it.
    fn selector(&self, selector: &str) -> Option<String> {
        let _ = selector;
        None
    }
}

/// Turns a left-to-right stylesheet into its right-to-left mirror.
#[allow(async_fn_in_trait)]
pub trait DirectionalTransform {
    async fn transform(
        &self,
        css: &str,
        options: &TransformOptions,
        extensions: &[Arc<dyn TransformExtension>],
    ) -> Result<String, TransformError>;
}

/// Run the engine with the pipeline's options and extensions.
pub async fn mirror<T>(engine: &T, css: &str, config: &PipelineConfig) -> Result<String, TransformError>
where
    T: DirectionalTransform + ?Sized,
{
    engine
        .transform(css, config.transform_options(), config.extensions())
        .await
}
