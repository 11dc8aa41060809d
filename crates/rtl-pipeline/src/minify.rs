//! Minify adapter

use crate::config::MinifyOptions;
use crate::error::MinifyError;

/// Compresses stylesheet text.
///
/// Called once for the original and once for the RTL variant of every
/// eligible asset; the two calls may be in flight at the same time.
#[allow(async_fn_in_trait)]
pub trait Minifier {
    async fn minify(&self, css: &str, options: &MinifyOptions) -> Result<String, MinifyError>;
}
