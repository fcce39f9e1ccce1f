//! Early wake-up for the poll loop.
//!
//! Filesystem notifications only shorten the sleep between iterations. The
//! loop still lists the input directory and claims by rename, so a missed or
//! spurious event costs at most one delay.

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;

/// Watches one directory and signals when new entries appear in it.
pub struct ChangeWaker {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

impl ChangeWaker {
    pub fn watch(dir: &Path) -> Result<Self> {
        // One pending signal is enough; bursts collapse into it
        let (tx, rx) = mpsc::channel::<()>(1);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    if is_arrival(&event.kind) {
                        let _ = tx.try_send(());
                    }
                }
            },
            Config::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch path: {:?}", dir))?;

        tracing::info!("Watching directory for changes: {:?}", dir);

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Resolve once something has arrived since the last call.
    ///
    /// Never resolves if the watcher has shut down.
    pub async fn changed(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(
                RenameMode::To | RenameMode::Both | RenameMode::Any
            ))
    )
}
