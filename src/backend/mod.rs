//! Filesystem backend abstraction shared by the base and layer stores.
//!
//! Both sides of the union speak the same capability set: path-based verbs
//! returning plain io errors, plus handle-based file I/O. Two implementations
//! ship with the crate:
//! - [`localfs::LocalFs`]: a host directory accessed through `tokio::fs`
//! - [`memfs::MemFs`]: an in-memory tree, used as a fast layer and in tests

pub mod localfs;
pub mod memfs;

use async_trait::async_trait;
use bitflags::bitflags;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Metadata snapshot for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub size: u64,
    pub modified: SystemTime,
    /// Unix permission bits.
    pub mode: u32,
    pub is_dir: bool,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

bitflags! {
    /// Open disposition flags, the portable subset of the POSIX open flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const READ = 1;
        const WRITE = 2;
        const APPEND = 4;
        const CREATE = 8;
        const TRUNCATE = 16;
    }
}

impl OpenFlags {
    /// True when the open may mutate the file (and therefore must reach the
    /// base store as well as the layer).
    pub fn is_write_class(&self) -> bool {
        self.intersects(
            OpenFlags::WRITE | OpenFlags::APPEND | OpenFlags::CREATE | OpenFlags::TRUNCATE,
        )
    }
}

pub type BoxedFile = Box<dyn File>;

/// An open file or directory handle.
#[async_trait]
pub trait File: Send {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    async fn flush(&mut self) -> io::Result<()>;
    /// Release the handle. Implementations flush pending writes; errors from
    /// the release itself are reported rather than swallowed.
    async fn close(&mut self) -> io::Result<()>;
    /// List entries when the handle refers to a directory.
    async fn read_dir(&mut self) -> io::Result<Vec<DirEntry>>;

    async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = self.read(&mut buf).await?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    async fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf).await?;
            if n == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            buf = &buf[n..];
        }
        Ok(())
    }
}

/// The capability set the union consumes from each backing store.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn stat(&self, path: &Path) -> io::Result<Metadata>;
    /// Open for reading. Directory paths yield a handle whose `read_dir`
    /// lists the directory.
    async fn open(&self, path: &Path) -> io::Result<BoxedFile>;
    async fn open_file(&self, path: &Path, flags: OpenFlags, perm: u32) -> io::Result<BoxedFile>;
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Remove a file or empty directory.
    async fn remove(&self, path: &Path) -> io::Result<()>;
    /// Remove a path and any children; absent paths are not an error.
    async fn remove_all(&self, path: &Path) -> io::Result<()>;
    async fn mkdir(&self, path: &Path, perm: u32) -> io::Result<()>;
    async fn mkdir_all(&self, path: &Path, perm: u32) -> io::Result<()>;
    async fn chmod(&self, path: &Path, mode: u32) -> io::Result<()>;
    async fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()>;

    /// Create (or truncate) a read-write file, `O_RDWR|O_CREATE|O_TRUNC` 0666.
    async fn create(&self, path: &Path) -> io::Result<BoxedFile> {
        self.open_file(
            path,
            OpenFlags::READ | OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            0o666,
        )
        .await
    }
}
