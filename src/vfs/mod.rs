//! Read-only virtual filesystem over a ZIP archive.
//!
//! The archive's flat entry list becomes a navigable tree:
//!
//! - `trie`: prefix trie mapping absolute paths to entry metadata
//! - `index`: one-time construction pass that synthesizes directory
//!   listings (including the always-present synthetic root)
//! - `handle`: per-open handles bridging two read strategies (seekable
//!   byte-range views for stored entries, one-shot decompression streams
//!   for everything else) plus directory enumeration
//! - `fs`: the [`ZipFs`] facade dispatching `open(path)` to the right
//!   handle kind
//!
//! Construction is eager and single-threaded; the resulting index is
//! immutable and safe to share across concurrent readers. All per-call
//! state lives in the returned handles.

mod error;
mod fs;
mod handle;
mod index;
mod trie;

pub use error::VfsError;
pub use handle::{DirHandle, Handle, Metadata, StoredFile, StreamFile};
pub use fs::ZipFs;
