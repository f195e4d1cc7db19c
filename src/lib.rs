//! cachefs: a read-through, write-through caching union filesystem.
//!
//! Two backing stores with identical capability sets are bound into one
//! virtual filesystem: an authoritative (possibly slow or remote) "base" and
//! a fast local "layer". Each operation classifies the path's cache state
//! against a freshness window, promotes base content into the layer when it
//! is stale or missing, and fans writes out to both stores. A background
//! watcher consumes external change notifications and keeps cached paths
//! current when something else writes to base.

pub mod backend;
pub mod error;
pub mod union;
pub mod watch;

pub use backend::localfs::LocalFs;
pub use backend::memfs::MemFs;
pub use backend::{Backend, BoxedFile, DirEntry, File, Metadata, OpenFlags};
pub use error::{CacheFsError, Result};
pub use union::file::UnionFile;
pub use union::CacheFs;
pub use watch::{ChangeEvent, ChangeSender, ChangeSource};
