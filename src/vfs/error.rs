//! Error types for the virtual filesystem.

use std::io;

use thiserror::Error;

/// Errors returned by [`ZipFs::open`](crate::ZipFs::open) and by operations
/// on an open [`Handle`](crate::Handle).
#[derive(Debug, Error)]
pub enum VfsError {
    /// The path is not indexed, or is not absolute.
    #[error("no such path: {0}")]
    NotFound(String),

    /// The operation does not apply to this handle kind, or the handle
    /// no longer represents a valid stream.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Seek on a sequentially-decompressed entry.
    ///
    /// Kept distinct from [`VfsError::InvalidOperation`] so callers such as
    /// an HTTP range layer can tell "this entry has no seek capability"
    /// apart from "wrong handle kind".
    #[error("seek not supported on compressed entry")]
    UnsupportedSeek,

    /// Failure propagated from the archive source (decompression errors,
    /// truncated data, offsets out of range).
    #[error("archive error: {0}")]
    Archive(#[source] anyhow::Error),
}

impl From<VfsError> for io::Error {
    fn from(err: VfsError) -> Self {
        let kind = match &err {
            VfsError::NotFound(_) => io::ErrorKind::NotFound,
            VfsError::InvalidOperation(_) => io::ErrorKind::InvalidInput,
            VfsError::UnsupportedSeek => io::ErrorKind::Unsupported,
            VfsError::Archive(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
