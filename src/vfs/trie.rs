//! Prefix trie keyed by path segments.
//!
//! Maps normalized absolute paths to opaque metadata. The trie knows
//! nothing about archives; the index built in [`super::index`] decides
//! what the metadata means.

use std::collections::BTreeMap;

/// One node of the trie.
///
/// A node's full path equals its parent's full path joined with its own
/// segment by `/`; the root node is `/`.
struct TrieNode<M> {
    path: String,
    children: BTreeMap<String, TrieNode<M>>,
    meta: Option<M>,
}

impl<M> TrieNode<M> {
    fn new(path: String) -> Self {
        Self {
            path,
            children: BTreeMap::new(),
            meta: None,
        }
    }
}

/// Prefix trie over absolute slash-separated paths.
///
/// Built once during filesystem construction and immutable afterwards.
/// Trailing slashes are stripped before indexing, except for the root
/// path itself. There is no deletion.
pub struct PathTrie<M> {
    root: TrieNode<M>,
}

impl<M> PathTrie<M> {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new("/".to_string()),
        }
    }

    /// Insert or overwrite the metadata at `path`, creating bare
    /// intermediate nodes as needed.
    pub fn add(&mut self, path: &str, meta: M) {
        let mut node = &mut self.root;
        for segment in segments(path) {
            let child_path = if node.path == "/" {
                format!("/{segment}")
            } else {
                format!("{}/{segment}", node.path)
            };
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| TrieNode::new(child_path));
        }
        node.meta = Some(meta);
    }

    /// Exact-match lookup. A miss is `None`, never an error.
    pub fn find(&self, path: &str) -> Option<&M> {
        self.node_at(path).and_then(|node| node.meta.as_ref())
    }

    /// Every stored full path in the subtree rooted at `prefix`,
    /// including `prefix` itself if populated.
    ///
    /// The prefix does not have to be stored, only resolvable as a node
    /// position. Enumeration order is path-lexical (children are kept in
    /// a `BTreeMap`), which keeps listings deterministic.
    pub fn prefix_search(&self, prefix: &str) -> Vec<String> {
        let mut paths = Vec::new();
        if let Some(node) = self.node_at(prefix) {
            collect(node, &mut paths);
        }
        paths
    }

    fn node_at(&self, path: &str) -> Option<&TrieNode<M>> {
        let mut node = &self.root;
        for segment in segments(path) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn collect<'a, M>(node: &'a TrieNode<M>, paths: &mut Vec<String>) {
    if node.meta.is_some() {
        paths.push(node.path.clone());
    }
    for child in node.children.values() {
        collect(child, paths);
    }
}
