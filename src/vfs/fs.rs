//! The virtual filesystem facade.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::io::{LocalFileReader, ReadAt, SectionReader};
use crate::zip::{CompressionMethod, ZipParser};

use super::error::VfsError;
use super::handle::{DirHandle, Handle, StoredFile, StreamFile};
use super::index::{Node, build_index, entry_metadata};
use super::trie::PathTrie;

/// A read-only virtual filesystem over the contents of a ZIP archive.
///
/// Construction parses the central directory once and builds an immutable
/// path index; after that the filesystem is freely shareable across
/// threads, and [`ZipFs::open`] is a pure read plus a fresh handle
/// allocation. The shared source must support independent concurrent
/// reads at arbitrary offsets (see [`ReadAt`]).
pub struct ZipFs<R: ReadAt> {
    parser: ZipParser<R>,
    trie: PathTrie<Node>,
    random_access: bool,
}

impl<R: ReadAt + 'static> ZipFs<R> {
    /// Build a filesystem with seeking disabled.
    ///
    /// Every file, stored or compressed, is read through a one-shot
    /// sequential stream.
    pub fn new(parser: ZipParser<R>) -> Result<Self> {
        Self::build(parser, false)
    }

    /// Build a filesystem backed by a random-access source.
    ///
    /// Stored (uncompressed) entries become seekable byte-range views;
    /// compressed entries still stream sequentially.
    pub fn with_random_access(parser: ZipParser<R>) -> Result<Self> {
        Self::build(parser, true)
    }

    fn build(parser: ZipParser<R>, random_access: bool) -> Result<Self> {
        let entries = parser.list_entries()?;
        let trie = build_index(&entries);
        Ok(Self {
            parser,
            trie,
            random_access,
        })
    }

    /// Open the file or directory at an absolute path.
    ///
    /// Paths must start with `/`; anything else reports
    /// [`VfsError::NotFound`]. Path normalization (dot segments, percent
    /// decoding) is the caller's job.
    pub fn open(&self, path: &str) -> Result<Handle<R>, VfsError> {
        if !path.starts_with('/') {
            return Err(VfsError::NotFound(path.to_string()));
        }

        match self.trie.find(path) {
            None => Err(VfsError::NotFound(path.to_string())),
            Some(Node::File(entry)) => {
                let base_name = entry.trimmed_name().rsplit('/').next().unwrap_or_default();
                let meta = entry_metadata(entry, base_name);

                if self.random_access && entry.compression_method == CompressionMethod::Stored {
                    // Stored bytes equal the entry's contents, so a bounded
                    // view into the shared source is enough for seekable
                    // reads.
                    let offset = self.parser.data_offset(entry).map_err(VfsError::Archive)?;
                    let section = SectionReader::new(
                        self.parser.reader().clone(),
                        offset,
                        entry.uncompressed_size,
                    );
                    Ok(Handle::Stored(StoredFile::new(meta, section)))
                } else {
                    let stream = self.parser.open_entry(entry).map_err(VfsError::Archive)?;
                    Ok(Handle::Stream(StreamFile::new(meta, stream)))
                }
            }
            Some(Node::Dir(listing)) | Some(Node::Root(listing)) => {
                // Fresh cursor per open; the indexed listing is shared
                // read-only.
                Ok(Handle::Dir(DirHandle::new(listing.clone())))
            }
        }
    }
}

impl ZipFs<LocalFileReader> {
    /// Open a ZIP archive from a file on disk, with seeking enabled.
    pub fn open_path(path: &Path) -> Result<Self> {
        let reader = Arc::new(LocalFileReader::new(path)?);
        Self::with_random_access(ZipParser::new(reader))
    }

    /// Open the archive appended to the running executable.
    pub fn open_current_exe() -> Result<Self> {
        let exe = std::env::current_exe().context("cannot locate current executable")?;
        Self::open_path(&exe).context("no archive appended to executable")
    }

    /// Open `path` if it exists, otherwise fall back to an archive
    /// appended to the running executable.
    pub fn init(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::open_path(path)
        } else {
            tracing::debug!(path = %path.display(), "archive not found, trying executable image");
            Self::open_current_exe()
        }
    }
}
