//! In-memory remote filesystem.
//!
//! [`MemoryFs`] answers `stat`/`lstat` the way a POSIX server would,
//! including symlink chains and dangling links, without any connection. Use
//! it to test code written against [`RemoteFileStat`], or as the backing store
//! of a test SFTP server.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{error::StatError, file_type::FileMode, stat::RemoteFileStat, Metadata};

/// Links followed during one resolution before giving up, as Linux does
pub const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File { size: u64 },
    Dir,
    Symlink { target: String },
    Fifo,
}

impl Node {
    fn attrs(&self) -> Metadata {
        let (mode, size) = match self {
            Self::File { size } => (FileMode::REG.bits() | 0o644, *size),
            Self::Dir => (FileMode::DIR.bits() | 0o755, 0),
            Self::Symlink { target } => (FileMode::LNK.bits() | 0o777, target.len() as u64),
            Self::Fifo => (FileMode::FIFO.bits() | 0o644, 0),
        };

        Metadata {
            size: Some(size),
            uid: Some(0),
            user: None,
            gid: Some(0),
            group: None,
            permissions: Some(mode),
            atime: Some(0),
            mtime: Some(0),
        }
    }
}

/// Shared handle to an in-memory tree. Clones see the same tree.
///
/// Relative paths are resolved against `/`.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    entries: Arc<RwLock<BTreeMap<String, Node>>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a path into its non-empty components
fn components(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

fn join(parts: &[String]) -> String {
    if parts.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Lexical parent and final name of `path`
fn split_parent(path: &str) -> Result<(String, String), StatError> {
    let mut parts: Vec<String> = Vec::new();
    for component in components(path) {
        match component {
            "." => {}
            ".." => {
                let _ = parts.pop();
            }
            name => parts.push(name.to_owned()),
        }
    }

    match parts.pop() {
        Some(name) => Ok((join(&parts), name)),
        None => Err(StatError::Other(format!("{path:?} names the root directory"))),
    }
}

impl MemoryFs {
    /// Creates a tree holding only the root directory
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        let _ = entries.insert("/".to_owned(), Node::Dir);

        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Node>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Node>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a regular file. The parent must exist; a link as parent is followed.
    pub fn create_file(&self, path: &str, contents: &[u8]) -> Result<(), StatError> {
        self.insert(
            path,
            Node::File {
                size: contents.len() as u64,
            },
        )
    }

    pub fn create_dir(&self, path: &str) -> Result<(), StatError> {
        self.insert(path, Node::Dir)
    }

    /// Creates a named pipe, the stand-in for every non-file, non-directory type
    pub fn create_fifo(&self, path: &str) -> Result<(), StatError> {
        self.insert(path, Node::Fifo)
    }

    /// Creates `link` pointing at `target`. The target is stored verbatim and
    /// need not exist.
    pub fn symlink(&self, link: &str, target: &str) -> Result<(), StatError> {
        self.insert(
            link,
            Node::Symlink {
                target: target.to_owned(),
            },
        )
    }

    /// Removes a file, fifo or symlink. Links are removed, not followed.
    pub fn remove_file(&self, path: &str) -> Result<(), StatError> {
        let mut entries = self.write();
        let (key, node) = Self::lookup(&entries, path, false)?;
        if node == Node::Dir {
            return Err(StatError::Other(format!("Is a directory: {path}")));
        }

        let _ = entries.remove(&key);
        Ok(())
    }

    /// Removes an empty directory
    pub fn remove_dir(&self, path: &str) -> Result<(), StatError> {
        let mut entries = self.write();
        let (key, node) = Self::lookup(&entries, path, false)?;
        if node != Node::Dir {
            return Err(StatError::NotADirectory(path.to_owned()));
        }
        if key == "/" {
            return Err(StatError::PermissionDenied(path.to_owned()));
        }

        let prefix = format!("{key}/");
        if entries.range(prefix.clone()..).next().is_some_and(|(k, _)| k.starts_with(&prefix)) {
            return Err(StatError::Other(format!("Directory not empty: {path}")));
        }

        let _ = entries.remove(&key);
        Ok(())
    }

    fn insert(&self, path: &str, node: Node) -> Result<(), StatError> {
        let (parent, name) = split_parent(path)?;

        let mut entries = self.write();
        let (parent_key, parent_node) = Self::lookup(&entries, &parent, true)?;
        if parent_node != Node::Dir {
            return Err(StatError::NotADirectory(parent));
        }

        let key = if parent_key == "/" {
            format!("/{name}")
        } else {
            format!("{parent_key}/{name}")
        };

        if entries.contains_key(&key) {
            return Err(StatError::Other(format!("File exists: {path}")));
        }

        let _ = entries.insert(key, node);
        Ok(())
    }

    /// Walks `path` component by component and returns the physical key of
    /// the entry it names. Symlinks in the middle of the path are always
    /// followed, a final one only if `follow_last` is set.
    fn lookup(
        entries: &BTreeMap<String, Node>,
        path: &str,
        follow_last: bool,
    ) -> Result<(String, Node), StatError> {
        // Each pending component remembers whether it came from a link target
        let mut pending: VecDeque<(String, bool)> = components(path)
            .map(|c| (c.to_owned(), false))
            .collect();
        let mut current: Vec<String> = Vec::new();
        let mut hops = 0;

        while let Some((component, from_link)) = pending.pop_front() {
            match component.as_str() {
                "." => continue,
                ".." => {
                    let _ = current.pop();
                    continue;
                }
                _ => {}
            }

            current.push(component);
            let key = join(&current);
            let node = match entries.get(&key) {
                Some(node) => node,
                None if from_link => return Err(StatError::BrokenLink(path.to_owned())),
                None => return Err(StatError::NotFound(path.to_owned())),
            };

            match node {
                Node::Symlink { target } if follow_last || !pending.is_empty() => {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(StatError::Other(format!(
                            "Too many levels of symbolic links: {path}"
                        )));
                    }

                    if target.is_empty() {
                        return Err(StatError::BrokenLink(path.to_owned()));
                    }

                    let _ = current.pop();
                    if target.starts_with('/') {
                        current.clear();
                    }
                    for component in components(target).rev() {
                        pending.push_front((component.to_owned(), true));
                    }
                }
                Node::Dir => {}
                _ if !pending.is_empty() => {
                    return Err(StatError::NotADirectory(path.to_owned()));
                }
                _ => {}
            }
        }

        let key = join(&current);
        match entries.get(&key) {
            Some(node) => Ok((key, node.clone())),
            None => Err(StatError::NotFound(path.to_owned())),
        }
    }
}

#[async_trait]
impl RemoteFileStat for MemoryFs {
    async fn stat(&self, path: &str) -> Result<Metadata, StatError> {
        Self::lookup(&self.read(), path, true).map(|(_, node)| node.attrs())
    }

    async fn lstat(&self, path: &str) -> Result<Metadata, StatError> {
        Self::lookup(&self.read(), path, false).map(|(_, node)| node.attrs())
    }

    async fn canonicalize(&self, path: &str) -> Result<String, StatError> {
        Self::lookup(&self.read(), path, true).map(|(key, _)| key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_type::FileKind;

    async fn kind(fs: &MemoryFs, path: &str, follow: bool) -> Result<FileKind, StatError> {
        let attrs = if follow {
            fs.stat(path).await?
        } else {
            fs.lstat(path).await?
        };
        Ok(FileKind::of(&attrs))
    }

    #[tokio::test]
    async fn relative_targets_resolve_from_the_link_directory() {
        let fs = MemoryFs::new();
        fs.create_dir("/a").unwrap();
        fs.create_dir("/a/b").unwrap();
        fs.create_file("/a/target", b"").unwrap();
        fs.symlink("/a/b/link", "../target").unwrap();

        assert_eq!(kind(&fs, "/a/b/link", true).await, Ok(FileKind::Regular));
        assert_eq!(kind(&fs, "/a/b/link", false).await, Ok(FileKind::Symlink));
        assert_eq!(fs.canonicalize("/a/b/link").await.unwrap(), "/a/target");
    }

    #[tokio::test]
    async fn intermediate_links_are_always_followed() {
        let fs = MemoryFs::new();
        fs.create_dir("/real").unwrap();
        fs.create_file("/real/f", b"abc").unwrap();
        fs.symlink("/alias", "/real").unwrap();

        assert_eq!(kind(&fs, "/alias/f", false).await, Ok(FileKind::Regular));
        assert_eq!(fs.lstat("/alias/f").await.unwrap().size, Some(3));
    }

    #[tokio::test]
    async fn dangling_link_is_a_broken_link() {
        let fs = MemoryFs::new();
        fs.symlink("/dangling", "/missing").unwrap();

        assert_eq!(
            fs.stat("/dangling").await.map(|_| ()),
            Err(StatError::BrokenLink("/dangling".to_owned()))
        );
        assert_eq!(kind(&fs, "/dangling", false).await, Ok(FileKind::Symlink));
        assert_eq!(
            fs.stat("/missing").await.map(|_| ()),
            Err(StatError::NotFound("/missing".to_owned()))
        );
    }

    #[tokio::test]
    async fn empty_link_target_does_not_resolve() {
        let fs = MemoryFs::new();
        fs.create_dir("/d").unwrap();
        fs.symlink("/d/empty", "").unwrap();

        assert_eq!(
            fs.stat("/d/empty").await.map(|_| ()),
            Err(StatError::BrokenLink("/d/empty".to_owned()))
        );
        assert!(fs.stat("/d/empty/x").await.is_err());
        assert_eq!(kind(&fs, "/d/empty", false).await, Ok(FileKind::Symlink));
    }

    #[tokio::test]
    async fn missing_entry_behind_a_valid_link_is_not_found() {
        let fs = MemoryFs::new();
        fs.create_dir("/real").unwrap();
        fs.symlink("/alias", "/real").unwrap();

        assert_eq!(
            fs.stat("/alias/missing").await.map(|_| ()),
            Err(StatError::NotFound("/alias/missing".to_owned()))
        );
    }

    #[tokio::test]
    async fn link_cycles_are_cut_off() {
        let fs = MemoryFs::new();
        fs.symlink("/ping", "pong").unwrap();
        fs.symlink("/pong", "ping").unwrap();

        assert!(matches!(fs.stat("/ping").await, Err(StatError::Other(_))));
        assert_eq!(kind(&fs, "/ping", false).await, Ok(FileKind::Symlink));
    }

    #[tokio::test]
    async fn files_have_no_children() {
        let fs = MemoryFs::new();
        fs.create_file("/f", b"").unwrap();

        assert_eq!(
            fs.stat("/f/child").await.map(|_| ()),
            Err(StatError::NotADirectory("/f/child".to_owned()))
        );
        assert!(fs.create_file("/f/child", b"").is_err());
    }

    #[test]
    fn remove_dir_rejects_non_empty_directories() {
        let fs = MemoryFs::new();
        fs.create_dir("/d").unwrap();
        fs.create_file("/d/f", b"").unwrap();
        fs.create_dir("/dd").unwrap();

        assert!(fs.remove_dir("/d").is_err());
        fs.remove_file("/d/f").unwrap();
        fs.remove_dir("/d").unwrap();
        fs.remove_dir("/dd").unwrap();
        assert!(fs.remove_dir("/").is_err());
    }

    #[test]
    fn remove_file_removes_the_link_not_the_target() {
        let fs = MemoryFs::new();
        fs.create_file("/f", b"").unwrap();
        fs.symlink("/l", "f").unwrap();
        fs.remove_file("/l").unwrap();

        assert!(fs.read().contains_key("/f"));
        assert!(!fs.read().contains_key("/l"));
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let fs = MemoryFs::new();
        fs.create_dir("/d").unwrap();
        assert!(fs.create_file("/d", b"").is_err());
        assert!(fs.symlink("/d", "x").is_err());
    }
}
