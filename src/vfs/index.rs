//! Virtual directory synthesis.
//!
//! Consumes the flat archive entry list once, at construction time, and
//! produces the immutable path index: one trie node per file, one per
//! explicit directory entry (populated with its immediate children), and
//! one synthetic root aggregating every top-level entry.
//!
//! Known limitation, inherited deliberately from the reference behavior:
//! directories that are only *implied* by deeper paths (never listed as
//! explicit directory entries in the archive) are not synthesized. Only
//! the root is synthetic; opening an implicit directory path reports
//! NotFound.

use std::sync::Arc;
use std::time::SystemTime;

use crate::zip::ZipEntry;

use super::handle::{DirListing, Metadata};
use super::trie::PathTrie;

/// What the trie stores per absolute path.
pub(crate) enum Node {
    /// A file entry, or a directory entry still pending synthesis.
    File(ZipEntry),
    /// An explicit directory with its immediate children.
    Dir(Arc<DirListing>),
    /// The synthetic root.
    Root(Arc<DirListing>),
}

/// Metadata snapshot for an entry, displayed under `name`.
///
/// Clones used in child listings carry the parent-relative name while
/// describing the same underlying entry.
pub(crate) fn entry_metadata(entry: &ZipEntry, name: &str) -> Metadata {
    Metadata {
        name: name.to_string(),
        size: if entry.is_directory {
            0
        } else {
            entry.uncompressed_size
        },
        mode: entry.unix_mode(),
        modified: entry.modified(),
        is_dir: entry.is_directory,
    }
}

/// Build the path index from the archive's entry list.
///
/// Two passes: the first indexes every entry (directories provisionally)
/// and collects the synthetic root's children in archive order; the
/// second resolves each explicit directory's immediate children by
/// prefix search and promotes it to a directory node. Child listings of
/// explicit directories follow the trie's path-lexical enumeration
/// order.
pub(crate) fn build_index(entries: &[ZipEntry]) -> PathTrie<Node> {
    tracing::debug!(entries = entries.len(), "building virtual filesystem index");

    let mut trie = PathTrie::new();
    let mut dirs: Vec<&ZipEntry> = Vec::new();
    let mut root_children: Vec<Metadata> = Vec::new();

    for entry in entries {
        let trimmed = entry.trimmed_name();
        if trimmed.is_empty() {
            // An explicit "/" entry carries nothing the synthetic root
            // does not already provide.
            continue;
        }

        if entry.is_directory {
            dirs.push(entry);
            trie.add(&format!("/{trimmed}"), Node::File(entry.clone()));
        } else {
            trie.add(&format!("/{}", entry.file_name), Node::File(entry.clone()));
        }

        if !trimmed.contains('/') {
            root_children.push(entry_metadata(entry, trimmed));
        }
    }

    // Resolve every directory's children against the fully-populated
    // provisional index before promoting any of them, so the outcome
    // does not depend on the order directories appear in the archive.
    let mut listings: Vec<(String, Arc<DirListing>)> = Vec::with_capacity(dirs.len());
    for entry in &dirs {
        let dir_path = format!("/{}", entry.trimmed_name());
        // Retains the trailing slash, so the directory itself and
        // same-prefix siblings never pass the filter below.
        let child_prefix = format!("/{}", entry.file_name);

        let mut children = Vec::new();
        for path in trie.prefix_search(&dir_path) {
            if !path.starts_with(&child_prefix) {
                continue;
            }
            let rel = path[child_prefix.len()..].trim_end_matches('/');
            if rel.is_empty() || rel.contains('/') {
                // Not an immediate child: the directory itself, or an
                // entry nested two or more levels down.
                continue;
            }
            if let Some(Node::File(child)) = trie.find(&path) {
                children.push(entry_metadata(child, rel));
            }
        }

        tracing::trace!(path = %dir_path, children = children.len(), "directory listing built");

        let base_name = entry
            .trimmed_name()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let header = Metadata {
            name: base_name,
            size: 0,
            mode: entry.unix_mode(),
            modified: entry.modified(),
            is_dir: true,
        };
        listings.push((dir_path, Arc::new(DirListing { header, children })));
    }

    for (path, listing) in listings {
        trie.add(&path, Node::Dir(listing));
    }

    // The synthetic root exists even for an empty archive.
    let root = DirListing {
        header: Metadata {
            name: "/".to_string(),
            size: 0,
            mode: 0o777,
            modified: SystemTime::now(),
            is_dir: true,
        },
        children: root_children,
    };
    trie.add("/", Node::Root(Arc::new(root)));

    trie
}
