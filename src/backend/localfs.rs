//! Local-directory backend: virtual paths mapped onto a host root directory.

use super::{Backend, BoxedFile, DirEntry, File, Metadata, OpenFlags};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Map a virtual path under the root. `..` never escapes the root.
    fn real(&self, path: &Path) -> PathBuf {
        let mut out = self.root.clone();
        for comp in path.components() {
            match comp {
                Component::Normal(c) => out.push(c),
                Component::ParentDir => {
                    if out != self.root {
                        out.pop();
                    }
                }
                _ => {}
            }
        }
        out
    }
}

fn meta_from(md: &std::fs::Metadata) -> io::Result<Metadata> {
    use std::os::unix::fs::PermissionsExt;
    Ok(Metadata {
        size: md.len(),
        modified: md.modified()?,
        mode: md.permissions().mode() & 0o7777,
        is_dir: md.is_dir(),
    })
}

#[async_trait]
impl Backend for LocalFs {
    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let md = tokio::fs::metadata(self.real(path)).await?;
        meta_from(&md)
    }

    async fn open(&self, path: &Path) -> io::Result<BoxedFile> {
        let real = self.real(path);
        let md = tokio::fs::metadata(&real).await?;
        if md.is_dir() {
            return Ok(Box::new(LocalFile::dir(real)));
        }
        let f = tokio::fs::File::open(&real).await?;
        Ok(Box::new(LocalFile::file(real, f)))
    }

    async fn open_file(&self, path: &Path, flags: OpenFlags, perm: u32) -> io::Result<BoxedFile> {
        let real = self.real(path);
        let mut opts = tokio::fs::OpenOptions::new();
        opts.read(flags.contains(OpenFlags::READ))
            .write(flags.contains(OpenFlags::WRITE))
            .append(flags.contains(OpenFlags::APPEND))
            .truncate(flags.contains(OpenFlags::TRUNCATE))
            .create(flags.contains(OpenFlags::CREATE))
            .mode(perm);
        let f = opts.open(&real).await?;
        Ok(Box::new(LocalFile::file(real, f)))
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(self.real(from), self.real(to)).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let real = self.real(path);
        let md = tokio::fs::metadata(&real).await?;
        if md.is_dir() {
            tokio::fs::remove_dir(real).await
        } else {
            tokio::fs::remove_file(real).await
        }
    }

    async fn remove_all(&self, path: &Path) -> io::Result<()> {
        let real = self.real(path);
        match tokio::fs::metadata(&real).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
            Ok(md) if md.is_dir() => tokio::fs::remove_dir_all(real).await,
            Ok(_) => tokio::fs::remove_file(real).await,
        }
    }

    async fn mkdir(&self, path: &Path, perm: u32) -> io::Result<()> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.mode(perm);
        builder.create(self.real(path)).await
    }

    async fn mkdir_all(&self, path: &Path, perm: u32) -> io::Result<()> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true).mode(perm);
        builder.create(self.real(path)).await
    }

    async fn chmod(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(self.real(path), std::fs::Permissions::from_mode(mode)).await
    }

    async fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        // No tokio equivalent; run the std futimens off the async threads.
        let real = self.real(path);
        tokio::task::spawn_blocking(move || {
            let f = std::fs::File::open(real)?;
            let times = std::fs::FileTimes::new()
                .set_accessed(atime)
                .set_modified(mtime);
            f.set_times(times)
        })
        .await?
    }
}

/// Handle over a host file; directory handles carry no fd and only serve
/// `read_dir`.
struct LocalFile {
    path: PathBuf,
    inner: Option<tokio::fs::File>,
}

impl LocalFile {
    fn file(path: PathBuf, f: tokio::fs::File) -> Self {
        Self {
            path,
            inner: Some(f),
        }
    }

    fn dir(path: PathBuf) -> Self {
        Self { path, inner: None }
    }
}

#[async_trait]
impl File for LocalFile {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Some(f) => f.read(buf).await,
            None => Err(io::ErrorKind::IsADirectory.into()),
        }
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            Some(f) => f.write(buf).await,
            None => Err(io::ErrorKind::IsADirectory.into()),
        }
    }

    async fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Some(f) => f.flush().await,
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> io::Result<()> {
        if let Some(mut f) = self.inner.take() {
            f.flush().await?;
        }
        Ok(())
    }

    async fn read_dir(&mut self) -> io::Result<Vec<DirEntry>> {
        if self.inner.is_some() {
            return Err(io::ErrorKind::NotADirectory.into());
        }
        let mut rd = tokio::fs::read_dir(&self.path).await?;
        let mut out = Vec::new();
        while let Some(entry) = rd.next_entry().await? {
            out.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type().await?.is_dir(),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}
