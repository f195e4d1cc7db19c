//! Promotion: copying a path's content and metadata from base into the layer.

use super::UnionInner;
use crate::backend::{Backend, File as _, OpenFlags};
use crate::error::{CacheFsError, Result};
use std::io;
use std::path::Path;

const COPY_BUF: usize = 64 * 1024;

impl<B: Backend, L: Backend> UnionInner<B, L> {
    /// Copy `path` from base into the layer, mirroring content, mode and
    /// modification time. Safe to call when the layer copy is already
    /// current; concurrent promotions converge on the last writer.
    pub(crate) async fn promote(&self, path: &Path) -> Result<()> {
        self.copy_to_layer(path)
            .await
            .map_err(|e| CacheFsError::promotion(path, e))
    }

    async fn copy_to_layer(&self, path: &Path) -> io::Result<()> {
        let bmeta = self.base.stat(path).await?;
        if bmeta.is_dir {
            // Directories carry no content; mirror the entry and its mtime.
            self.layer.mkdir_all(path, bmeta.mode).await?;
            return self.layer.chtimes(path, bmeta.modified, bmeta.modified).await;
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.layer.mkdir_all(parent, 0o755).await?;
        }
        let mut src = self.base.open(path).await?;
        let mut dst = self
            .layer
            .open_file(
                path,
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                bmeta.mode,
            )
            .await?;
        let mut buf = vec![0u8; COPY_BUF];
        loop {
            let n = src.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            dst.write_all(&buf[..n]).await?;
        }
        dst.close().await?;
        src.close().await?;
        self.layer.chmod(path, bmeta.mode).await?;
        self.layer.chtimes(path, bmeta.modified, bmeta.modified).await
    }
}
