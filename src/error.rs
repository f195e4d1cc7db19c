//! Error taxonomy for the caching union filesystem.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheFsError>;

/// Errors surfaced by [`crate::union::CacheFs`] verbs.
///
/// Plain backing-store errors pass through transparently so callers keep the
/// standard io error classes (not-found, permission denied, ...). Promotion
/// and partial base/layer failures carry the path they concern.
#[derive(Debug, Error)]
pub enum CacheFsError {
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Copying a path from base into the cache layer failed.
    #[error("promotion of {path:?} into the cache layer failed: {source}")]
    Promotion {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The base store applied the mutation but the layer leg failed. The
    /// base-side effect is not rolled back; the stores are transiently
    /// divergent until the next promotion.
    #[error("{op} applied to base but failed on the cache layer for {path:?}: {source}")]
    Partial {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheFsError {
    /// True when the underlying failure is a not-found class io error.
    pub fn is_not_found(&self) -> bool {
        match self {
            CacheFsError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            CacheFsError::Promotion { source, .. } | CacheFsError::Partial { source, .. } => {
                source.kind() == io::ErrorKind::NotFound
            }
        }
    }

    pub(crate) fn promotion(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheFsError::Promotion {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn partial(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheFsError::Partial {
            op,
            path: path.into(),
            source,
        }
    }
}
