//! Polling watcher for new deposit directories

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives every deposit directory the watcher sees for the first time
#[async_trait]
pub trait DepositListener: Send + Sync {
    async fn on_new_deposit(&self, deposit_dir: PathBuf);
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct InboxWatcher {
    inbox: PathBuf,
    poll_interval: Duration,
    /// Survives stop/start so a path is reported at most once per watcher
    seen: Arc<Mutex<HashSet<PathBuf>>>,
    running: Mutex<Option<Running>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InboxWatcher {
    pub fn new(inbox: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            inbox: inbox.into(),
            poll_interval,
            seen: Arc::new(Mutex::new(HashSet::new())),
            running: Mutex::new(None),
        }
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    /// Immediate subdirectories not reported before, sorted by path, now marked as seen
    pub fn scan(&self) -> std::io::Result<Vec<PathBuf>> {
        scan(&self.inbox, &self.seen)
    }

    pub fn is_running(&self) -> bool {
        lock(&self.running).is_some()
    }

    /// Report existing deposits, then poll until [`stop`](Self::stop) is called
    ///
    /// Starting a watcher that is already running does nothing.
    pub fn start(&self, listener: Arc<dyn DepositListener>) {
        let mut running = lock(&self.running);
        if running.is_some() {
            warn!(inbox = %self.inbox.display(), "Inbox watcher already running");
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let inbox = self.inbox.clone();
        let seen = Arc::clone(&self.seen);
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handle = tokio::spawn(async move {
            info!(inbox = %inbox.display(), "Inbox watcher started");
            'watch: loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        match scan(&inbox, &seen) {
                            Ok(found) => {
                                let mut pending = found.into_iter();
                                while let Some(deposit_dir) = pending.next() {
                                    debug!(deposit = %deposit_dir.display(), "New deposit in inbox");
                                    tokio::select! {
                                        biased;
                                        _ = listener.on_new_deposit(deposit_dir.clone()) => {},
                                        _ = token.cancelled() => {
                                            // Not handed over, so report them again after a restart
                                            forget(&seen, std::iter::once(deposit_dir).chain(pending));
                                            break 'watch;
                                        },
                                    }
                                }
                            },
                            Err(e) => warn!(inbox = %inbox.display(), error = %e, "Failed to scan inbox"),
                        }
                    }
                }
            }
            info!(inbox = %inbox.display(), "Inbox watcher stopped");
        });

        *running = Some(Running { cancel, handle });
    }

    pub async fn stop(&self) {
        let running = lock(&self.running).take();
        if let Some(Running { cancel, handle }) = running {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "Inbox watcher ended abnormally");
            }
        }
    }
}

fn scan(inbox: &Path, seen: &Mutex<HashSet<PathBuf>>) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(inbox)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut seen = lock(seen);
    Ok(dirs.into_iter().filter(|d| seen.insert(d.clone())).collect())
}

fn forget(seen: &Mutex<HashSet<PathBuf>>, dirs: impl IntoIterator<Item = PathBuf>) {
    let mut seen = lock(seen);
    for dir in dirs {
        seen.remove(&dir);
    }
}
