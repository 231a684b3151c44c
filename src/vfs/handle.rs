//! Open-file handles over the virtual filesystem.
//!
//! [`ZipFs::open`](super::ZipFs::open) returns one [`Handle`] per call.
//! A handle is the only stateful object in the filesystem: directory
//! enumeration cursors and stream positions live here, never in the
//! shared index, so independently opened handles on the same path cannot
//! interfere with each other.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::time::SystemTime;

use crate::io::{ReadAt, SectionReader};

use super::error::VfsError;

/// Immutable metadata snapshot for one virtual file or directory.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) mode: u32,
    pub(crate) modified: SystemTime,
    pub(crate) is_dir: bool,
}

impl Metadata {
    /// Display name: the base name for entries, the parent-relative name
    /// for directory children, `/` for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size in bytes (0 for directories).
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Unix permission bits.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Modification time.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Whether this names a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// A directory's header plus its immediate children, built once during
/// construction and shared read-only by every handle opened on it.
///
/// The child list contains only entries nested exactly one level below
/// the directory, in deterministic order (archive order for the root,
/// path-lexical order for explicit directories).
#[derive(Debug)]
pub(crate) struct DirListing {
    pub(crate) header: Metadata,
    pub(crate) children: Vec<Metadata>,
}

/// An open view over one file or directory.
///
/// Three structurally different behaviors behind one contract, dispatched
/// by the metadata kind found at open time:
///
/// - [`Handle::Stored`]: bounded random-access view into the shared
///   archive source; supports `read` and `seek`.
/// - [`Handle::Stream`]: one-shot sequential decompression stream;
///   `seek` always fails with [`VfsError::UnsupportedSeek`].
/// - [`Handle::Dir`]: directory listing with a per-handle cursor;
///   `read` and `seek` always fail with [`VfsError::InvalidOperation`].
pub enum Handle<R: ReadAt> {
    Stored(StoredFile<R>),
    Stream(StreamFile),
    Dir(DirHandle),
}

/// Random-access handle over a stored (uncompressed) entry.
pub struct StoredFile<R: ReadAt> {
    meta: Metadata,
    section: SectionReader<R>,
}

impl<R: ReadAt> StoredFile<R> {
    pub(crate) fn new(meta: Metadata, section: SectionReader<R>) -> Self {
        Self { meta, section }
    }
}

/// Sequential handle draining a one-shot decompression stream.
pub struct StreamFile {
    meta: Metadata,
    reader: Option<Box<dyn Read + Send>>,
}

impl StreamFile {
    pub(crate) fn new(meta: Metadata, reader: Box<dyn Read + Send>) -> Self {
        Self {
            meta,
            reader: Some(reader),
        }
    }
}

/// Directory handle with its own enumeration cursor.
pub struct DirHandle {
    listing: Arc<DirListing>,
    cursor: usize,
}

impl DirHandle {
    pub(crate) fn new(listing: Arc<DirListing>) -> Self {
        Self { listing, cursor: 0 }
    }
}

impl<R: ReadAt> Handle<R> {
    /// Metadata snapshot for the opened path.
    pub fn metadata(&self) -> &Metadata {
        match self {
            Handle::Stored(file) => &file.meta,
            Handle::Stream(file) => &file.meta,
            Handle::Dir(dir) => &dir.listing.header,
        }
    }

    /// Read bytes from a file handle.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, VfsError> {
        match self {
            Handle::Stored(file) => file.section.read(buf).map_err(map_io),
            Handle::Stream(file) => match file.reader.as_mut() {
                Some(reader) => reader.read(buf).map_err(map_io),
                None => Err(VfsError::InvalidOperation("file handle is closed")),
            },
            Handle::Dir(_) => Err(VfsError::InvalidOperation("is a directory")),
        }
    }

    /// Seek within a random-access file handle.
    ///
    /// Only [`Handle::Stored`] supports this; sequential streams report
    /// [`VfsError::UnsupportedSeek`] on every call, regardless of prior
    /// read progress.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, VfsError> {
        match self {
            Handle::Stored(file) => file.section.seek(pos).map_err(map_io),
            Handle::Stream(_) => Err(VfsError::UnsupportedSeek),
            Handle::Dir(_) => Err(VfsError::InvalidOperation("is a directory")),
        }
    }

    /// Consume up to `count` children from a directory handle's cursor.
    ///
    /// A `count` of zero or less, or one exceeding what remains, drains
    /// all remaining children. Once the listing is exhausted, every
    /// further call returns an empty vector; exhaustion is never an
    /// error.
    pub fn read_dir(&mut self, count: isize) -> Result<Vec<Metadata>, VfsError> {
        match self {
            Handle::Dir(dir) => {
                let remaining = dir.listing.children.len() - dir.cursor;
                let take = if count <= 0 || count as usize > remaining {
                    remaining
                } else {
                    count as usize
                };
                let batch = dir.listing.children[dir.cursor..dir.cursor + take].to_vec();
                dir.cursor += take;
                Ok(batch)
            }
            _ => Err(VfsError::InvalidOperation("not a directory")),
        }
    }

    /// Release any resources held by the handle.
    ///
    /// A no-op for stored and directory handles; for stream handles this
    /// drops the decompression stream, after which reads fail with
    /// [`VfsError::InvalidOperation`].
    pub fn close(&mut self) {
        if let Handle::Stream(file) = self {
            file.reader = None;
        }
    }
}

fn map_io(err: io::Error) -> VfsError {
    VfsError::Archive(err.into())
}

impl<R: ReadAt> Read for Handle<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Handle::read(self, buf).map_err(io::Error::from)
    }
}

impl<R: ReadAt> Seek for Handle<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Handle::seek(self, pos).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::LocalFileReader;
    use std::time::UNIX_EPOCH;

    type TestHandle = Handle<LocalFileReader>;

    fn meta(name: &str, is_dir: bool) -> Metadata {
        Metadata {
            name: name.to_string(),
            size: 0,
            mode: if is_dir { 0o755 } else { 0o644 },
            modified: UNIX_EPOCH,
            is_dir,
        }
    }

    fn dir_listing() -> Arc<DirListing> {
        Arc::new(DirListing {
            header: meta("/", true),
            children: vec![meta("a", false), meta("b", false), meta("c", true)],
        })
    }

    #[test]
    fn dir_cursor_is_monotonic() {
        let mut handle: TestHandle = Handle::Dir(DirHandle::new(dir_listing()));

        let first = handle.read_dir(2).unwrap();
        assert_eq!(
            first.iter().map(|m| m.name()).collect::<Vec<_>>(),
            ["a", "b"]
        );

        let second = handle.read_dir(2).unwrap();
        assert_eq!(second.iter().map(|m| m.name()).collect::<Vec<_>>(), ["c"]);

        // Exhausted: consistently empty, never an error.
        assert!(handle.read_dir(2).unwrap().is_empty());
        assert!(handle.read_dir(-1).unwrap().is_empty());
    }

    #[test]
    fn dir_negative_count_drains_all() {
        let mut handle: TestHandle = Handle::Dir(DirHandle::new(dir_listing()));
        assert_eq!(handle.read_dir(-1).unwrap().len(), 3);
        assert!(handle.read_dir(0).unwrap().is_empty());
    }

    #[test]
    fn two_handles_do_not_share_a_cursor() {
        let listing = dir_listing();
        let mut first: TestHandle = Handle::Dir(DirHandle::new(listing.clone()));
        let mut second: TestHandle = Handle::Dir(DirHandle::new(listing));

        assert_eq!(first.read_dir(0).unwrap().len(), 3);
        assert_eq!(second.read_dir(0).unwrap().len(), 3);
    }

    #[test]
    fn dir_rejects_read_and_seek() {
        let mut handle: TestHandle = Handle::Dir(DirHandle::new(dir_listing()));
        let mut buf = [0u8; 4];
        assert!(matches!(
            Handle::read(&mut handle, &mut buf),
            Err(VfsError::InvalidOperation(_))
        ));
        assert!(matches!(
            Handle::seek(&mut handle, SeekFrom::Start(0)),
            Err(VfsError::InvalidOperation(_))
        ));
    }

    #[test]
    fn stream_rejects_seek_and_reads_after_close() {
        let data: Box<dyn Read + Send> = Box::new(std::io::Cursor::new(b"hello".to_vec()));
        let mut handle: TestHandle = Handle::Stream(StreamFile::new(meta("a", false), data));

        assert!(matches!(
            Handle::seek(&mut handle, SeekFrom::Start(1)),
            Err(VfsError::UnsupportedSeek)
        ));

        let mut out = [0u8; 2];
        assert_eq!(Handle::read(&mut handle, &mut out).unwrap(), 2);
        // Seek still fails after read progress.
        assert!(matches!(
            Handle::seek(&mut handle, SeekFrom::Start(0)),
            Err(VfsError::UnsupportedSeek)
        ));

        handle.close();
        assert!(matches!(
            Handle::read(&mut handle, &mut out),
            Err(VfsError::InvalidOperation(_))
        ));
    }

    #[test]
    fn file_handles_reject_read_dir() {
        let data: Box<dyn Read + Send> = Box::new(std::io::Cursor::new(Vec::new()));
        let mut handle: TestHandle = Handle::Stream(StreamFile::new(meta("a", false), data));
        assert!(matches!(
            handle.read_dir(1),
            Err(VfsError::InvalidOperation(_))
        ));
    }
}
