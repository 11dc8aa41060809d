//! Watch mode: re-run the pass whenever the build directory changes

use std::time::Duration;

use eyre::{Result, WrapErr};
use notify::{EventKind, RecursiveMode, Watcher};
use rtl_pipeline::BuildPlugin;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::host::{BuildDir, run_pass};

/// Quiet period after the last event before a pass starts.
const DEBOUNCE: Duration = Duration::from_millis(150);

/// Watch `dir` and run a pass per debounced batch of changes, reusing
/// `plugin` so unchanged units are skipped. Returns when the watcher stops.
pub async fn watch<P: BuildPlugin>(plugin: &mut P, dir: &BuildDir) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .wrap_err("failed to start file watcher")?;
    watcher
        .watch(dir.root().as_std_path(), RecursiveMode::Recursive)
        .wrap_err_with(|| format!("failed to watch {}", dir.root()))?;
    info!(dir = %dir.root(), "watching for changes");

    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(Some(next)) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {
            batch.push(next);
        }

        let events: Vec<notify::Event> = batch
            .into_iter()
            .filter_map(|res| {
                res.inspect_err(|err| warn!(%err, "watch error"))
                    .ok()
            })
            .collect();
        if !is_relevant(&events) {
            continue;
        }

        debug!(events = events.len(), "change detected");
        match run_pass(plugin, dir).await {
            Ok(report) => debug!(processed = report.processed.len(), "pass complete"),
            Err(err) => error!("{err:?}"),
        }
    }
    Ok(())
}

/// Whether a batch contains anything but reads.
fn is_relevant(events: &[notify::Event]) -> bool {
    events
        .iter()
        .any(|event| !matches!(event.kind, EventKind::Access(_)))
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    use super::*;

    #[test]
    fn test_reads_do_not_trigger_a_pass() {
        let read = notify::Event::new(EventKind::Access(AccessKind::Any));
        assert!(!is_relevant(&[read.clone()]));
        assert!(!is_relevant(&[]));

        let write = notify::Event::new(EventKind::Modify(ModifyKind::Any));
        assert!(is_relevant(&[read, write]));
        assert!(is_relevant(&[notify::Event::new(EventKind::Create(CreateKind::File))]));
    }
}
