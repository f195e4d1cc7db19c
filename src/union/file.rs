//! Fan-out handle bridging a base and a layer sub-handle.

use crate::backend::{BoxedFile, DirEntry, File};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;

/// A handle over up to two underlying handles.
///
/// Reads come from the layer when present (it holds the promoted copy),
/// otherwise from base. Writes are mirrored to both so the stores stay in
/// sync. Directory listings merge both sides, deduplicated by name with the
/// layer winning.
pub struct UnionFile {
    base: Option<BoxedFile>,
    layer: Option<BoxedFile>,
}

impl UnionFile {
    pub(crate) fn new(base: Option<BoxedFile>, layer: Option<BoxedFile>) -> Self {
        Self { base, layer }
    }

    fn no_handle() -> io::Error {
        io::Error::new(io::ErrorKind::InvalidInput, "union handle has no sides")
    }
}

#[async_trait]
impl File for UnionFile {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(l) = &mut self.layer {
            l.read(buf).await
        } else if let Some(b) = &mut self.base {
            b.read(buf).await
        } else {
            Err(Self::no_handle())
        }
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.base.is_none() && self.layer.is_none() {
            return Err(Self::no_handle());
        }
        if let Some(b) = &mut self.base {
            b.write_all(buf).await?;
        }
        if let Some(l) = &mut self.layer {
            l.write_all(buf).await?;
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> io::Result<()> {
        if let Some(b) = &mut self.base {
            b.flush().await?;
        }
        if let Some(l) = &mut self.layer {
            l.flush().await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        // Close both sides before reporting anything; first error wins.
        let mut first_err = None;
        if let Some(mut b) = self.base.take()
            && let Err(e) = b.close().await
        {
            first_err = Some(e);
        }
        if let Some(mut l) = self.layer.take()
            && let Err(e) = l.close().await
        {
            first_err.get_or_insert(e);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn read_dir(&mut self) -> io::Result<Vec<DirEntry>> {
        let mut merged = BTreeMap::new();
        if let Some(b) = &mut self.base {
            for entry in b.read_dir().await? {
                merged.insert(entry.name.clone(), entry);
            }
        }
        if let Some(l) = &mut self.layer {
            for entry in l.read_dir().await? {
                merged.insert(entry.name.clone(), entry);
            }
        }
        if self.base.is_none() && self.layer.is_none() {
            return Err(Self::no_handle());
        }
        Ok(merged.into_values().collect())
    }
}
