//! In-memory VFS implementation.
//!
//! The entire file tree lives in an insertion-ordered `IndexMap<String, Node>`
//! whose keys are canonical absolute paths. There are no parent/child links:
//! children and descendants are found by scanning every key for a string
//! prefix, so those queries are O(n) in the number of stored paths. Nothing
//! enforces that a path's parent entry exists.

use archterm_types::error::FsError;
use indexmap::IndexMap;

use crate::node::Node;
use crate::path::{basename, descendant_prefix, parent};

/// Timestamp carried by the root and template entries.
pub const EPOCH_LABEL: &str = "Jan  1 00:00";

/// A fully in-memory virtual file system.
///
/// `Clone` is a deep copy; two clones never share nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryVfs {
    /// Map of canonical paths to nodes, in insertion order.
    nodes: IndexMap<String, Node>,
}

impl MemoryVfs {
    /// Create a new in-memory VFS with only the root directory.
    pub fn new() -> Self {
        let mut nodes = IndexMap::new();
        let mut root = Node::dir(EPOCH_LABEL);
        root.owner = "root".to_string();
        nodes.insert("/".to_string(), root);
        Self { nodes }
    }

    /// Number of stored paths, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root is never removed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        self.nodes.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Node> {
        self.nodes.get_mut(path)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.nodes.get(path).is_some_and(Node::is_dir)
    }

    /// Insert or replace a node. A replaced key keeps its original position.
    pub fn insert(&mut self, path: impl Into<String>, node: Node) -> Option<Node> {
        let path = path.into();
        debug_assert!(path.starts_with('/'), "non-canonical key {path}");
        self.nodes.insert(path, node)
    }

    /// Remove exactly one path. The root cannot be removed.
    pub fn remove(&mut self, path: &str) -> Option<Node> {
        if path == "/" {
            return None;
        }
        self.nodes.shift_remove(path)
    }

    /// Remove a path and every stored path prefixed by `path + "/"`.
    ///
    /// Returns the number of removed entries. The root is refused.
    pub fn remove_tree(&mut self, path: &str) -> usize {
        if path == "/" {
            return 0;
        }
        let prefix = descendant_prefix(path);
        let before = self.nodes.len();
        self.nodes
            .retain(|key, _| key != path && !key.starts_with(&prefix));
        let removed = before - self.nodes.len();
        log::trace!("removed {removed} entries under {path}");
        removed
    }

    /// Direct children of `path`, in insertion order. O(n).
    pub fn children(&self, path: &str) -> Vec<(&str, &Node)> {
        let prefix = descendant_prefix(path);
        self.nodes
            .iter()
            .filter(|(key, _)| {
                key.as_str() != path
                    && key
                        .strip_prefix(&prefix)
                        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .map(|(key, node)| (key.as_str(), node))
            .collect()
    }

    /// Whether any stored path lies below `path`. O(n).
    pub fn has_descendants(&self, path: &str) -> bool {
        let prefix = descendant_prefix(path);
        self.nodes
            .keys()
            .any(|key| key != path && key.starts_with(&prefix))
    }

    /// `path` itself (if stored) followed by everything below it.
    pub fn subtree<'a>(&'a self, path: &'a str) -> impl Iterator<Item = (&'a str, &'a Node)> {
        let prefix = descendant_prefix(path);
        self.iter()
            .filter(move |(key, _)| *key == path || key.starts_with(&prefix))
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(k, n)| (k.as_str(), n))
    }

    /// Entries whose parent is `dir` and whose name starts with `prefix`.
    pub fn entries_named(&self, dir: &str, prefix: &str) -> Vec<(&str, &Node)> {
        self.iter()
            .filter(|(path, _)| {
                *path != dir && parent(path) == dir && basename(path).starts_with(prefix)
            })
            .collect()
    }

    /// File content at `path`.
    pub fn read(&self, path: &str) -> Result<&str, FsError> {
        match self.nodes.get(path) {
            Some(node) => node.content().ok_or(FsError::IsADirectory),
            None => Err(FsError::NotFound),
        }
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}
