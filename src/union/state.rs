//! Cache coherency classification.

use super::UnionInner;
use crate::backend::{Backend, Metadata};
use crate::error::Result;
use std::io;
use std::path::Path;

/// Trust classification for one path, derived fresh on every access and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// The layer copy is usable; carries layer metadata.
    Hit(Metadata),
    /// Base has a strictly newer copy; carries base metadata so callers can
    /// skip a second stat after promoting.
    Stale(Metadata),
    /// The freshness window elapsed but base could not be statted; the layer
    /// is authoritative (offline operation, or a layer-only path). Carries
    /// layer metadata.
    Local(Metadata),
    /// No layer entry.
    Miss,
}

impl<B: Backend, L: Backend> UnionInner<B, L> {
    /// Classify `path` against the freshness window.
    ///
    /// A zero window means layer entries never expire. Base stat failures
    /// degrade to `Local` instead of erroring so the union keeps working
    /// when base is unreachable.
    pub(crate) async fn classify(&self, path: &Path) -> Result<CacheState> {
        let lmeta = match self.layer.stat(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheState::Miss),
            Err(e) => return Err(e.into()),
        };
        if self.fresh_for.is_zero() {
            return Ok(CacheState::Hit(lmeta));
        }
        let expired = match lmeta.modified.elapsed() {
            Ok(age) => age > self.fresh_for,
            // An mtime in the future counts as fresh.
            Err(_) => false,
        };
        if !expired {
            return Ok(CacheState::Hit(lmeta));
        }
        match self.base.stat(path).await {
            Err(_) => Ok(CacheState::Local(lmeta)),
            Ok(bmeta) if bmeta.modified > lmeta.modified => Ok(CacheState::Stale(bmeta)),
            Ok(_) => Ok(CacheState::Hit(lmeta)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memfs::MemFs;
    use crate::backend::File;
    use std::path::Path;
    use std::time::{Duration, SystemTime};

    async fn put(fs: &MemFs, path: &str, data: &[u8], age: Duration) {
        let mut f = fs.create(Path::new(path)).await.unwrap();
        f.write_all(data).await.unwrap();
        f.close().await.unwrap();
        let then = SystemTime::now() - age;
        fs.chtimes(Path::new(path), then, then).await.unwrap();
    }

    fn inner(base: MemFs, layer: MemFs, window: Duration) -> UnionInner<MemFs, MemFs> {
        UnionInner {
            base,
            layer,
            fresh_for: window,
        }
    }

    #[tokio::test]
    async fn test_fresh_layer_entry_is_hit() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/a", b"layer", Duration::ZERO).await;
        let u = inner(base, layer, Duration::from_secs(3600));
        match u.classify(Path::new("/a")).await.unwrap() {
            CacheState::Hit(m) => assert_eq!(m.size, 5),
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_window_never_consults_base() {
        let base = MemFs::new();
        let layer = MemFs::new();
        // layer entry is ancient and base has a newer, larger copy
        put(&layer, "/b", b"old", Duration::from_secs(86400)).await;
        put(&base, "/b", b"newer-and-longer", Duration::ZERO).await;
        let u = inner(base, layer, Duration::ZERO);
        match u.classify(Path::new("/b")).await.unwrap() {
            CacheState::Hit(m) => assert_eq!(m.size, 3),
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_newer_base_is_stale_with_base_metadata() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/a", b"old", Duration::from_secs(7200)).await;
        put(&base, "/a", b"fresh!!", Duration::ZERO).await;
        let u = inner(base, layer, Duration::from_secs(3600));
        match u.classify(Path::new("/a")).await.unwrap() {
            CacheState::Stale(m) => assert_eq!(m.size, 7),
            other => panic!("expected stale, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_base_is_local() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/only-here", b"cached", Duration::from_secs(7200)).await;
        let u = inner(base, layer, Duration::from_secs(1));
        match u.classify(Path::new("/only-here")).await.unwrap() {
            CacheState::Local(m) => assert_eq!(m.size, 6),
            other => panic!("expected local, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_elapsed_window_with_unchanged_base_is_hit() {
        let base = MemFs::new();
        let layer = MemFs::new();
        put(&layer, "/a", b"same", Duration::from_secs(7200)).await;
        put(&base, "/a", b"same", Duration::from_secs(7200)).await;
        // The two `put` calls sample `SystemTime::now()` independently, which
        // would leave base microseconds newer than layer; pin both stores to
        // the same instant so the fixture actually models an unchanged base.
        let then = SystemTime::now() - Duration::from_secs(7200);
        layer.chtimes(Path::new("/a"), then, then).await.unwrap();
        base.chtimes(Path::new("/a"), then, then).await.unwrap();
        let u = inner(base, layer, Duration::from_secs(3600));
        assert!(matches!(
            u.classify(Path::new("/a")).await.unwrap(),
            CacheState::Hit(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_layer_entry_is_miss() {
        let u = inner(MemFs::new(), MemFs::new(), Duration::from_secs(1));
        assert_eq!(u.classify(Path::new("/nope")).await.unwrap(), CacheState::Miss);
    }
}
