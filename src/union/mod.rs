//! The caching union filesystem: a fast layer in front of an authoritative
//! base, with per-verb cache-coherency dispatch.

pub mod file;
pub mod promote;
pub mod state;

use crate::backend::{Backend, BoxedFile, DirEntry, File as _, Metadata, OpenFlags};
use crate::error::{CacheFsError, Result};
use crate::watch::{self, ChangeSource};
use file::UnionFile;
use log::warn;
use state::CacheState;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::oneshot;

/// State shared between the foreground dispatcher and the invalidation
/// watcher: the two stores and the freshness window. Promotion and
/// classification live here so both consumers use the same routines.
pub(crate) struct UnionInner<B: Backend, L: Backend> {
    pub(crate) base: B,
    pub(crate) layer: L,
    pub(crate) fresh_for: Duration,
}

/// A read-through, write-through caching filesystem over two backends.
///
/// Every verb classifies the path first (see [`state::CacheState`]), promotes
/// the base copy into the layer when it is stale or missing, and then fans
/// the operation out to base and/or layer. Reads are served from the layer
/// whenever it is trustworthy; writes land in both stores. A background
/// watcher consumes external change notifications and eagerly re-promotes
/// cached paths written behind our back; it stops when the `CacheFs` is
/// dropped.
///
/// A zero `fresh_for` window means layer entries never expire on their own;
/// only the watcher refreshes them.
pub struct CacheFs<B: Backend, L: Backend> {
    inner: Arc<UnionInner<B, L>>,
    // Dropped with the CacheFs, which closes the channel and stops the
    // watcher task.
    _shutdown: oneshot::Sender<()>,
}

impl<B: Backend, L: Backend> CacheFs<B, L> {
    /// Build the union over `base` and `layer` and start the invalidation
    /// watcher on `source`. Must be called within a tokio runtime.
    pub fn new(base: B, layer: L, fresh_for: Duration, source: ChangeSource) -> Self {
        let inner = Arc::new(UnionInner {
            base,
            layer,
            fresh_for,
        });
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(watch::run(inner.clone(), source, shutdown_rx));
        Self {
            inner,
            _shutdown: shutdown_tx,
        }
    }

    pub fn base(&self) -> &B {
        &self.inner.base
    }

    pub fn layer(&self) -> &L {
        &self.inner.layer
    }

    pub fn fresh_for(&self) -> Duration {
        self.inner.fresh_for
    }

    /// Metadata for `path`. Served from the layer when it is trustworthy; a
    /// miss stats base directly rather than forcing a full copy, a stale
    /// entry is promoted and answered with the base metadata the classifier
    /// already fetched.
    pub async fn stat(&self, path: &Path) -> Result<Metadata> {
        match self.inner.classify(path).await? {
            CacheState::Miss => Ok(self.inner.base.stat(path).await?),
            CacheState::Stale(bmeta) => {
                self.inner.promote(path).await?;
                Ok(bmeta)
            }
            CacheState::Hit(lmeta) | CacheState::Local(lmeta) => Ok(lmeta),
        }
    }

    pub async fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
        match self.inner.classify(path).await? {
            CacheState::Local(_) => {}
            CacheState::Hit(_) => self.inner.base.chtimes(path, atime, mtime).await?,
            CacheState::Stale(_) | CacheState::Miss => {
                self.inner.promote(path).await?;
                self.inner.base.chtimes(path, atime, mtime).await?;
            }
        }
        self.inner
            .layer
            .chtimes(path, atime, mtime)
            .await
            .map_err(|e| CacheFsError::partial("chtimes", path, e))
    }

    pub async fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        match self.inner.classify(path).await? {
            CacheState::Local(_) => {}
            CacheState::Hit(_) => self.inner.base.chmod(path, mode).await?,
            CacheState::Stale(_) | CacheState::Miss => {
                self.inner.promote(path).await?;
                self.inner.base.chmod(path, mode).await?;
            }
        }
        self.inner
            .layer
            .chmod(path, mode)
            .await
            .map_err(|e| CacheFsError::partial("chmod", path, e))
    }

    pub async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        match self.inner.classify(from).await? {
            CacheState::Local(_) => {}
            CacheState::Hit(_) => self.inner.base.rename(from, to).await?,
            CacheState::Stale(_) | CacheState::Miss => {
                self.inner.promote(from).await?;
                self.inner.base.rename(from, to).await?;
            }
        }
        self.inner
            .layer
            .rename(from, to)
            .await
            .map_err(|e| CacheFsError::partial("rename", from, e))
    }

    /// Remove a file or empty directory from both stores. No promotion:
    /// copying a file into the cache just to delete it would be wasted I/O.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        match self.inner.classify(path).await? {
            CacheState::Local(_) => {}
            _ => self.inner.base.remove(path).await?,
        }
        self.inner
            .layer
            .remove(path)
            .await
            .map_err(|e| CacheFsError::partial("remove", path, e))
    }

    pub async fn remove_all(&self, path: &Path) -> Result<()> {
        match self.inner.classify(path).await? {
            CacheState::Local(_) => {}
            _ => self.inner.base.remove_all(path).await?,
        }
        self.inner
            .layer
            .remove_all(path)
            .await
            .map_err(|e| CacheFsError::partial("remove_all", path, e))
    }

    /// Open for reading. Files are promoted into the layer as needed and
    /// served from there; directories that exist on both sides come back as
    /// a merged handle so listings reflect base and layer alike.
    pub async fn open(&self, path: &Path) -> Result<BoxedFile> {
        match self.inner.classify(path).await? {
            CacheState::Local(_) => Ok(self.inner.layer.open(path).await?),
            CacheState::Miss => {
                let bmeta = self.inner.base.stat(path).await?;
                if bmeta.is_dir {
                    return Ok(self.inner.base.open(path).await?);
                }
                self.inner.promote(path).await?;
                Ok(self.inner.layer.open(path).await?)
            }
            CacheState::Stale(bmeta) if !bmeta.is_dir => {
                self.inner.promote(path).await?;
                Ok(self.inner.layer.open(path).await?)
            }
            CacheState::Hit(lmeta) if !lmeta.is_dir => Ok(self.inner.layer.open(path).await?),
            // Hit/Stale directories: combined view over both stores. A
            // failed layer open still yields a handle as long as base
            // delivered one.
            CacheState::Hit(_) | CacheState::Stale(_) => {
                let bfile = self.inner.base.open(path).await.ok();
                let lfile = match self.inner.layer.open(path).await {
                    Ok(f) => Some(f),
                    Err(e) if bfile.is_none() => return Err(e.into()),
                    Err(_) => None,
                };
                Ok(Box::new(UnionFile::new(bfile, lfile)))
            }
        }
    }

    /// Open with explicit flags. Write-class flags return a fan-out handle
    /// so the bytes land in both stores; read-only opens are served from the
    /// layer after promotion.
    pub async fn open_file(&self, path: &Path, flags: OpenFlags, perm: u32) -> Result<BoxedFile> {
        match self.inner.classify(path).await? {
            CacheState::Local(_) | CacheState::Hit(_) => {}
            state => match self.inner.promote(path).await {
                Ok(()) => {}
                // A miss with CREATE may be a brand-new path that exists in
                // neither store yet; the open below creates it in both.
                Err(e)
                    if e.is_not_found()
                        && state == CacheState::Miss
                        && flags.contains(OpenFlags::CREATE) => {}
                Err(e) => return Err(e),
            },
        }
        if flags.is_write_class() {
            let mut bfile = self.inner.base.open_file(path, flags, perm).await?;
            match self.inner.layer.open_file(path, flags, perm).await {
                Ok(lfile) => Ok(Box::new(UnionFile::new(Some(bfile), Some(lfile)))),
                Err(e) => {
                    // Don't leak the base handle; the truncated/created base
                    // file stays, per the no-rollback contract.
                    if let Err(ce) = bfile.close().await {
                        warn!("closing base handle for {path:?} after layer open failure: {ce}");
                    }
                    Err(CacheFsError::partial("open_file", path, e))
                }
            }
        } else {
            Ok(self.inner.layer.open_file(path, flags, perm).await?)
        }
    }

    /// Create (or truncate) the path in both stores, returning a fan-out
    /// handle. A layer-side failure closes the base handle before erroring.
    pub async fn create(&self, path: &Path) -> Result<BoxedFile> {
        let mut bfile = self.inner.base.create(path).await?;
        match self.inner.layer.create(path).await {
            Ok(lfile) => Ok(Box::new(UnionFile::new(Some(bfile), Some(lfile)))),
            Err(e) => {
                if let Err(ce) = bfile.close().await {
                    warn!("closing base handle for {path:?} after layer create failure: {ce}");
                }
                Err(CacheFsError::partial("create", path, e))
            }
        }
    }

    /// Create the directory in base first; the layer side always uses the
    /// all-parents variant because the layer may not mirror base's tree yet.
    pub async fn mkdir(&self, path: &Path, perm: u32) -> Result<()> {
        self.inner.base.mkdir(path, perm).await?;
        self.inner
            .layer
            .mkdir_all(path, perm)
            .await
            .map_err(|e| CacheFsError::partial("mkdir", path, e))
    }

    pub async fn mkdir_all(&self, path: &Path, perm: u32) -> Result<()> {
        self.inner.base.mkdir_all(path, perm).await?;
        self.inner
            .layer
            .mkdir_all(path, perm)
            .await
            .map_err(|e| CacheFsError::partial("mkdir_all", path, e))
    }

    /// Convenience listing: open the path and read its (possibly merged)
    /// directory entries.
    pub async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut f = self.open(path).await?;
        let entries = f.read_dir().await?;
        f.close().await?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memfs::MemFs;
    use crate::backend::File;
    use crate::watch::ChangeSource;
    use std::io;
    use std::path::Path;

    const HOUR: Duration = Duration::from_secs(3600);

    fn cachefs(base: &MemFs, layer: &MemFs, window: Duration) -> CacheFs<MemFs, MemFs> {
        let (_tx, source) = ChangeSource::channel(8);
        CacheFs::new(base.clone(), layer.clone(), window, source)
    }

    async fn put(fs: &MemFs, path: &str, data: &[u8], age: Duration) {
        if let Some(parent) = Path::new(path).parent()
            && parent != Path::new("/")
        {
            fs.mkdir_all(parent, 0o755).await.unwrap();
        }
        let mut f = fs.create(Path::new(path)).await.unwrap();
        f.write_all(data).await.unwrap();
        f.close().await.unwrap();
        let then = SystemTime::now() - age;
        fs.chtimes(Path::new(path), then, then).await.unwrap();
    }

    async fn read_all(fs: &MemFs, path: &str) -> Vec<u8> {
        let mut f = fs.open(Path::new(path)).await.unwrap();
        f.read_to_end().await.unwrap()
    }

    #[tokio::test]
    async fn test_stat_fresh_layer_entry_skips_base() {
        let base = MemFs::new();
        let layer = MemFs::new();
        // only the layer knows this path; a base consult would not find it
        put(&layer, "/a", b"cached", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);
        let md = fs.stat(Path::new("/a")).await.unwrap();
        assert_eq!(md.size, 6);
    }

    #[tokio::test]
    async fn test_stat_stale_promotes_and_returns_base_metadata() {
        let base = MemFs::new();
        let layer = MemFs::new();
        // layer at T-2h, base at T, window 1h: classify must say stale
        put(&layer, "/a", b"old", Duration::from_secs(2 * 3600)).await;
        put(&base, "/a", b"new-content", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let md = fs.stat(Path::new("/a")).await.unwrap();
        let bmeta = base.stat(Path::new("/a")).await.unwrap();
        assert_eq!(md.size, bmeta.size);
        assert_eq!(md.modified, bmeta.modified);
        // the stale stat promoted the fresh copy into the layer
        assert_eq!(read_all(&layer, "/a").await, b"new-content");
        assert_eq!(
            layer.stat(Path::new("/a")).await.unwrap().modified,
            bmeta.modified
        );
    }

    #[tokio::test]
    async fn test_stat_miss_consults_base_without_promoting() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&base, "/only-base", b"hello", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let md = fs.stat(Path::new("/only-base")).await.unwrap();
        assert_eq!(md.size, 5);
        // stat alone must not force a copy
        assert!(layer.stat(Path::new("/only-base")).await.is_err());
    }

    #[tokio::test]
    async fn test_zero_window_serves_layer_forever() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/b", b"cached", Duration::from_secs(30 * 86400)).await;
        put(&base, "/b", b"much newer content", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, Duration::ZERO);

        assert_eq!(fs.stat(Path::new("/b")).await.unwrap().size, 6);
        let mut f = fs.open(Path::new("/b")).await.unwrap();
        assert_eq!(f.read_to_end().await.unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_unreachable_base_serves_from_layer() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/offline", b"still here", Duration::from_secs(7200)).await;
        let fs = cachefs(&base, &layer, Duration::from_secs(1));

        assert_eq!(fs.stat(Path::new("/offline")).await.unwrap().size, 10);
        let mut f = fs.open(Path::new("/offline")).await.unwrap();
        assert_eq!(f.read_to_end().await.unwrap(), b"still here");
    }

    #[tokio::test]
    async fn test_open_miss_promotes_then_serves_layer() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&base, "/f", b"fetched", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let mut f = fs.open(Path::new("/f")).await.unwrap();
        assert_eq!(f.read_to_end().await.unwrap(), b"fetched");
        assert_eq!(read_all(&layer, "/f").await, b"fetched");
    }

    #[tokio::test]
    async fn test_open_stale_serves_promoted_content() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/f", b"old", Duration::from_secs(7200)).await;
        put(&base, "/f", b"current", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let mut f = fs.open(Path::new("/f")).await.unwrap();
        assert_eq!(f.read_to_end().await.unwrap(), b"current");
    }

    #[tokio::test]
    async fn test_open_directory_merges_both_stores() {
        let base = MemFs::new();
        let layer = MemFs::new();
        base.mkdir_all(Path::new("/d"), 0o755).await.unwrap();
        layer.mkdir_all(Path::new("/d"), 0o755).await.unwrap();
        put(&base, "/d/base-only", b"1", Duration::ZERO).await;
        put(&layer, "/d/layer-only", b"2", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let names: Vec<_> = fs
            .read_dir(Path::new("/d"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["base-only", "layer-only"]);
    }

    #[tokio::test]
    async fn test_open_miss_directory_falls_through_to_base() {
        let base = MemFs::new();
        let layer = MemFs::new();
        base.mkdir_all(Path::new("/only-base"), 0o755).await.unwrap();
        put(&base, "/only-base/x", b"1", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let entries = fs.read_dir(Path::new("/only-base")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "x");
    }

    #[tokio::test]
    async fn test_write_open_lands_in_both_stores() {
        let base = MemFs::new();
        let layer = MemFs::new();
        let fs = cachefs(&base, &layer, HOUR);

        let mut f = fs
            .open_file(
                Path::new("/new"),
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                0o644,
            )
            .await
            .unwrap();
        f.write_all(b"both sides").await.unwrap();
        f.close().await.unwrap();

        assert_eq!(read_all(&base, "/new").await, b"both sides");
        assert_eq!(read_all(&layer, "/new").await, b"both sides");
    }

    #[tokio::test]
    async fn test_write_open_on_stale_path_promotes_first() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/f", b"old", Duration::from_secs(7200)).await;
        put(&base, "/f", b"123456", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let mut f = fs
            .open_file(Path::new("/f"), OpenFlags::WRITE | OpenFlags::APPEND, 0o644)
            .await
            .unwrap();
        f.write_all(b"+tail").await.unwrap();
        f.close().await.unwrap();

        assert_eq!(read_all(&base, "/f").await, b"123456+tail");
        assert_eq!(read_all(&layer, "/f").await, b"123456+tail");
    }

    #[tokio::test]
    async fn test_read_only_open_file_serves_layer() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&base, "/f", b"data", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let mut f = fs
            .open_file(Path::new("/f"), OpenFlags::READ, 0)
            .await
            .unwrap();
        assert_eq!(f.read_to_end().await.unwrap(), b"data");
        assert_eq!(read_all(&layer, "/f").await, b"data");
    }

    #[tokio::test]
    async fn test_create_lands_in_both_stores() {
        let base = MemFs::new();
        let layer = MemFs::new();
        let fs = cachefs(&base, &layer, HOUR);

        let mut f = fs.create(Path::new("/made")).await.unwrap();
        f.write_all(b"x").await.unwrap();
        f.close().await.unwrap();
        assert_eq!(read_all(&base, "/made").await, b"x");
        assert_eq!(read_all(&layer, "/made").await, b"x");
    }

    #[tokio::test]
    async fn test_mkdir_base_failure_leaves_layer_untouched() {
        let base = MemFs::new();
        let layer = MemFs::new();
        // a file occupies the name in base, so mkdir fails there
        put(&base, "/d", b"not a dir", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);

        let err = fs.mkdir(Path::new("/d"), 0o755).await.err().unwrap();
        assert!(matches!(err, CacheFsError::Io(_)));
        assert!(layer.stat(Path::new("/d")).await.is_err());
    }

    #[tokio::test]
    async fn test_create_layer_failure_surfaces_partial_error() {
        let base = MemFs::new();
        let layer = MemFs::new();
        // base has the parent directory, the layer does not
        base.mkdir_all(Path::new("/d"), 0o755).await.unwrap();
        let fs = cachefs(&base, &layer, HOUR);

        match fs.create(Path::new("/d/f")).await.err().unwrap() {
            CacheFsError::Partial { op, path, .. } => {
                assert_eq!(op, "create");
                assert_eq!(path, Path::new("/d/f"));
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
        // the base side effect is not rolled back, the layer stays untouched
        assert!(base.stat(Path::new("/d/f")).await.is_ok());
        assert!(layer.stat(Path::new("/d/f")).await.is_err());
    }

    #[tokio::test]
    async fn test_write_open_layer_failure_surfaces_partial_error() {
        let base = MemFs::new();
        let layer = MemFs::new();
        base.mkdir_all(Path::new("/d"), 0o755).await.unwrap();
        let fs = cachefs(&base, &layer, HOUR);

        let err = fs
            .open_file(
                Path::new("/d/f"),
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                0o644,
            )
            .await
            .err()
            .unwrap();
        match err {
            CacheFsError::Partial { op, .. } => assert_eq!(op, "open_file"),
            other => panic!("expected partial failure, got {other:?}"),
        }
        // base handle was closed, not leaked, and the created file remains
        assert!(base.stat(Path::new("/d/f")).await.is_ok());
        assert!(layer.stat(Path::new("/d/f")).await.is_err());
    }

    #[tokio::test]
    async fn test_mkdir_creates_layer_parents() {
        let base = MemFs::new();
        let layer = MemFs::new();
        base.mkdir_all(Path::new("/a"), 0o755).await.unwrap();
        // layer has no /a yet; the single mkdir must still succeed there
        let fs = cachefs(&base, &layer, HOUR);
        fs.mkdir(Path::new("/a/b"), 0o755).await.unwrap();
        assert!(base.stat(Path::new("/a/b")).await.unwrap().is_dir);
        assert!(layer.stat(Path::new("/a/b")).await.unwrap().is_dir);
    }

    #[tokio::test]
    async fn test_rename_applies_to_both_stores() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&base, "/from", b"v", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);
        // cache it first so the layer has something to rename
        fs.open(Path::new("/from")).await.unwrap();

        fs.rename(Path::new("/from"), Path::new("/to")).await.unwrap();
        assert!(base.stat(Path::new("/to")).await.is_ok());
        assert!(layer.stat(Path::new("/to")).await.is_ok());
        assert!(base.stat(Path::new("/from")).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_applies_to_both_stores() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&base, "/gone", b"v", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);
        fs.open(Path::new("/gone")).await.unwrap();

        fs.remove(Path::new("/gone")).await.unwrap();
        assert!(base.stat(Path::new("/gone")).await.is_err());
        assert!(layer.stat(Path::new("/gone")).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_local_path_skips_base() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/cache-only", b"v", Duration::from_secs(7200)).await;
        let fs = cachefs(&base, &layer, Duration::from_secs(1));

        fs.remove(Path::new("/cache-only")).await.unwrap();
        assert!(layer.stat(Path::new("/cache-only")).await.is_err());
    }

    #[tokio::test]
    async fn test_chmod_applies_to_both_stores() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&base, "/f", b"v", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);
        fs.open(Path::new("/f")).await.unwrap();

        fs.chmod(Path::new("/f"), 0o600).await.unwrap();
        assert_eq!(base.stat(Path::new("/f")).await.unwrap().mode, 0o600);
        assert_eq!(layer.stat(Path::new("/f")).await.unwrap().mode, 0o600);
    }

    #[tokio::test]
    async fn test_chtimes_applies_to_both_stores() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&base, "/f", b"v", Duration::ZERO).await;
        let fs = cachefs(&base, &layer, HOUR);
        fs.open(Path::new("/f")).await.unwrap();

        let then = SystemTime::now() - Duration::from_secs(1234);
        fs.chtimes(Path::new("/f"), then, then).await.unwrap();
        assert_eq!(base.stat(Path::new("/f")).await.unwrap().modified, then);
        assert_eq!(layer.stat(Path::new("/f")).await.unwrap().modified, then);
    }

    #[tokio::test]
    async fn test_missing_everywhere_is_not_found() {
        let fs = cachefs(&MemFs::new(), &MemFs::new(), HOUR);
        let err = fs.stat(Path::new("/ghost")).await.err().unwrap();
        assert!(err.is_not_found());
        let err = fs.open(Path::new("/ghost")).await.err().unwrap();
        assert!(err.is_not_found());
        match fs.remove(Path::new("/ghost")).await.err().unwrap() {
            CacheFsError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
