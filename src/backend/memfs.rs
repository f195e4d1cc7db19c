//! In-memory backend: a mutex-guarded map of normalized paths to nodes.
//!
//! Clones share the same tree, which lets tests hold onto a store after
//! handing it to the union.

use super::{Backend, BoxedFile, DirEntry, File, Metadata, OpenFlags};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

#[derive(Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    File,
    Dir,
}

struct Node {
    kind: NodeKind,
    data: Vec<u8>,
    mode: u32,
    modified: SystemTime,
}

impl Node {
    fn dir(mode: u32) -> Self {
        Self {
            kind: NodeKind::Dir,
            data: Vec::new(),
            mode,
            modified: SystemTime::now(),
        }
    }

    fn file(mode: u32) -> Self {
        Self {
            kind: NodeKind::File,
            data: Vec::new(),
            mode,
            modified: SystemTime::now(),
        }
    }
}

#[derive(Clone)]
pub struct MemFs {
    nodes: Arc<Mutex<HashMap<String, Node>>>,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found() -> io::Error {
    io::ErrorKind::NotFound.into()
}

/// Normalize to an absolute slash-separated key ("/", "/a/b", ...).
fn norm(path: &Path) -> String {
    let joined = path
        .to_string_lossy()
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

fn parent_of(key: &str) -> String {
    match key.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(n) => key[..n].to_string(),
    }
}

impl MemFs {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert("/".to_string(), Node::dir(0o755));
        Self {
            nodes: Arc::new(Mutex::new(nodes)),
        }
    }
}

#[async_trait]
impl Backend for MemFs {
    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let nodes = self.nodes.lock().unwrap();
        let node = nodes.get(&norm(path)).ok_or_else(not_found)?;
        Ok(Metadata {
            size: node.data.len() as u64,
            modified: node.modified,
            mode: node.mode,
            is_dir: node.kind == NodeKind::Dir,
        })
    }

    async fn open(&self, path: &Path) -> io::Result<BoxedFile> {
        let key = norm(path);
        let nodes = self.nodes.lock().unwrap();
        let node = nodes.get(&key).ok_or_else(not_found)?;
        Ok(Box::new(MemFile {
            fs: self.clone(),
            key,
            pos: 0,
            writable: false,
            append: false,
            dir: node.kind == NodeKind::Dir,
        }))
    }

    async fn open_file(&self, path: &Path, flags: OpenFlags, perm: u32) -> io::Result<BoxedFile> {
        let key = norm(path);
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get_mut(&key) {
            Some(node) if node.kind == NodeKind::Dir => {
                if flags.is_write_class() {
                    return Err(io::ErrorKind::IsADirectory.into());
                }
                return Ok(Box::new(MemFile {
                    fs: self.clone(),
                    key,
                    pos: 0,
                    writable: false,
                    append: false,
                    dir: true,
                }));
            }
            Some(node) => {
                if flags.contains(OpenFlags::TRUNCATE) {
                    node.data.clear();
                    node.modified = SystemTime::now();
                }
            }
            None => {
                if !flags.contains(OpenFlags::CREATE) {
                    return Err(not_found());
                }
                match nodes.get(&parent_of(&key)) {
                    Some(p) if p.kind == NodeKind::Dir => {}
                    _ => return Err(not_found()),
                }
                nodes.insert(key.clone(), Node::file(perm));
            }
        }
        Ok(Box::new(MemFile {
            fs: self.clone(),
            key,
            pos: 0,
            writable: flags.is_write_class(),
            append: flags.contains(OpenFlags::APPEND),
            dir: false,
        }))
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from = norm(from);
        let to = norm(to);
        let mut nodes = self.nodes.lock().unwrap();
        if !nodes.contains_key(&from) {
            return Err(not_found());
        }
        // Move the node and, for directories, the whole subtree.
        let prefix = format!("{from}/");
        let moved: Vec<String> = nodes
            .keys()
            .filter(|k| **k == from || k.starts_with(&prefix))
            .cloned()
            .collect();
        for key in moved {
            if let Some(node) = nodes.remove(&key) {
                let suffix = &key[from.len()..];
                nodes.insert(format!("{to}{suffix}"), node);
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let key = norm(path);
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes.get(&key).ok_or_else(not_found)?;
        if node.kind == NodeKind::Dir {
            let prefix = format!("{key}/");
            if nodes.keys().any(|k| k.starts_with(&prefix)) {
                return Err(io::ErrorKind::DirectoryNotEmpty.into());
            }
        }
        nodes.remove(&key);
        Ok(())
    }

    async fn remove_all(&self, path: &Path) -> io::Result<()> {
        let key = norm(path);
        let mut nodes = self.nodes.lock().unwrap();
        if key == "/" {
            // Emptying the tree still leaves the root directory in place.
            nodes.retain(|k, _| k == "/");
            return Ok(());
        }
        let prefix = format!("{key}/");
        nodes.retain(|k, _| *k != key && !k.starts_with(&prefix));
        Ok(())
    }

    async fn mkdir(&self, path: &Path, perm: u32) -> io::Result<()> {
        let key = norm(path);
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.contains_key(&key) {
            return Err(io::ErrorKind::AlreadyExists.into());
        }
        match nodes.get(&parent_of(&key)) {
            Some(p) if p.kind == NodeKind::Dir => {}
            _ => return Err(not_found()),
        }
        nodes.insert(key, Node::dir(perm));
        Ok(())
    }

    async fn mkdir_all(&self, path: &Path, perm: u32) -> io::Result<()> {
        let key = norm(path);
        let mut nodes = self.nodes.lock().unwrap();
        let mut cur = String::new();
        for part in key.split('/').filter(|s| !s.is_empty()) {
            cur.push('/');
            cur.push_str(part);
            match nodes.get(&cur) {
                Some(n) if n.kind == NodeKind::Dir => {}
                Some(_) => return Err(io::ErrorKind::AlreadyExists.into()),
                None => {
                    nodes.insert(cur.clone(), Node::dir(perm));
                }
            }
        }
        Ok(())
    }

    async fn chmod(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes.get_mut(&norm(path)).ok_or_else(not_found)?;
        node.mode = mode;
        Ok(())
    }

    async fn chtimes(&self, path: &Path, _atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes.get_mut(&norm(path)).ok_or_else(not_found)?;
        node.modified = mtime;
        Ok(())
    }
}

struct MemFile {
    fs: MemFs,
    key: String,
    pos: usize,
    writable: bool,
    append: bool,
    dir: bool,
}

#[async_trait]
impl File for MemFile {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.dir {
            return Err(io::ErrorKind::IsADirectory.into());
        }
        let nodes = self.fs.nodes.lock().unwrap();
        let node = nodes.get(&self.key).ok_or_else(not_found)?;
        if self.pos >= node.data.len() {
            return Ok(0);
        }
        let n = (node.data.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&node.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::ErrorKind::PermissionDenied.into());
        }
        let mut nodes = self.fs.nodes.lock().unwrap();
        let node = nodes.get_mut(&self.key).ok_or_else(not_found)?;
        let at = if self.append { node.data.len() } else { self.pos };
        if at + buf.len() > node.data.len() {
            node.data.resize(at + buf.len(), 0);
        }
        node.data[at..at + buf.len()].copy_from_slice(buf);
        node.modified = SystemTime::now();
        self.pos = at + buf.len();
        Ok(buf.len())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn read_dir(&mut self) -> io::Result<Vec<DirEntry>> {
        if !self.dir {
            return Err(io::ErrorKind::NotADirectory.into());
        }
        let nodes = self.fs.nodes.lock().unwrap();
        let prefix = if self.key == "/" {
            "/".to_string()
        } else {
            format!("{}/", self.key)
        };
        let mut out = Vec::new();
        for (key, node) in nodes.iter() {
            if let Some(rest) = key.strip_prefix(&prefix)
                && !rest.is_empty()
                && !rest.contains('/')
            {
                out.push(DirEntry {
                    name: rest.to_string(),
                    is_dir: node.kind == NodeKind::Dir,
                });
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}
