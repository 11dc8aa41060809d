//! Filesystem host for the RTL pipeline.
//!
//! Treats a build output directory as the artifact table, runs one pass (or
//! keeps watching), and writes changed files back.

pub mod args;
pub mod config_file;
pub mod host;
pub mod watch;

use eyre::Result;
use rtl_css::{LightningMinifier, MirrorEngine};
use rtl_pipeline::RtlPlugin;
use tracing::{debug, error};

pub use args::Args;
pub use host::BuildDir;

/// Run the tool as described by `args`.
pub async fn run(args: Args) -> Result<()> {
    let config = config_file::resolve(&args)?;
    debug!(?config, "resolved configuration");

    let dir = BuildDir::new(args.dir.clone(), args.manifest.clone());
    let mut plugin = RtlPlugin::new(config, MirrorEngine, LightningMinifier);

    let outcome = host::run_pass(&mut plugin, &dir).await;
    if !args.watch {
        return outcome.map(|_| ());
    }
    if let Err(err) = outcome {
        error!("{err:?}");
    }
    watch::watch(&mut plugin, &dir).await
}
