//! Invalidation watcher: consumes external change notifications for the base
//! store and eagerly re-promotes cached paths that were written behind our
//! back.
//!
//! The notification mechanism itself (inotify, fanotify, a remote event
//! feed...) is external; it hands the union a stream of path-level events
//! plus a parallel error stream. The watcher is a single consumer, so events
//! for the same path are handled in delivery order.

use crate::backend::Backend;
use crate::union::state::CacheState;
use crate::union::UnionInner;
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One path-level notification from the base filesystem.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub path: PathBuf,
    /// True for write-class events; everything else is ignored.
    pub write: bool,
}

impl ChangeEvent {
    pub fn write(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write: true,
        }
    }
}

/// Producer half handed to whatever watches the base filesystem.
#[derive(Clone)]
pub struct ChangeSender {
    pub events: mpsc::Sender<ChangeEvent>,
    pub errors: mpsc::Sender<io::Error>,
}

/// Consumer half owned by the watcher task.
pub struct ChangeSource {
    pub events: mpsc::Receiver<ChangeEvent>,
    pub errors: mpsc::Receiver<io::Error>,
}

impl ChangeSource {
    /// Build a connected sender/source pair.
    pub fn channel(capacity: usize) -> (ChangeSender, ChangeSource) {
        let (etx, erx) = mpsc::channel(capacity);
        let (ftx, frx) = mpsc::channel(capacity);
        (
            ChangeSender {
                events: etx,
                errors: ftx,
            },
            ChangeSource {
                events: erx,
                errors: frx,
            },
        )
    }
}

/// The watcher loop. Ends when the owning `CacheFs` is dropped (shutdown
/// channel closes) or when the event stream itself closes, which means the
/// subscription is gone for good. Per-path failures are logged and skipped;
/// they never stop the loop.
pub(crate) async fn run<B: Backend, L: Backend>(
    inner: Arc<UnionInner<B, L>>,
    mut source: ChangeSource,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut errors_open = true;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("invalidation watcher stopped");
                break;
            }
            ev = source.events.recv() => match ev {
                None => {
                    debug!("change event stream closed, invalidation watcher exiting");
                    break;
                }
                Some(ev) if ev.write => handle_write(&inner, &ev.path).await,
                Some(_) => {}
            },
            err = source.errors.recv(), if errors_open => match err {
                None => errors_open = false,
                Some(e) => warn!("change source error: {e}"),
            },
        }
    }
}

async fn handle_write<B: Backend, L: Backend>(inner: &UnionInner<B, L>, path: &Path) {
    let state = match inner.classify(path).await {
        Ok(state) => state,
        Err(e) => {
            warn!("cache status of {path:?} after write event: {e}");
            return;
        }
    };
    match state {
        CacheState::Local(meta) | CacheState::Stale(meta) | CacheState::Hit(meta)
            if !meta.is_dir =>
        {
            match inner.promote(path).await {
                Ok(()) => debug!("re-promoted {path:?} after external write"),
                Err(e) => warn!("re-promotion of {path:?} failed: {e}"),
            }
        }
        // Misses were never cached and directories carry no content.
        _ => {}
    }
}
