//! # zipfs
//!
//! Serve the contents of a ZIP archive as a read-only virtual filesystem.
//!
//! A ZIP archive is a flat list of named, possibly-compressed byte blobs.
//! This crate indexes that list into a navigable tree of directories and
//! files: paths can be looked up, directories listed, and files read as
//! byte streams, without extracting anything to disk. Archives can live
//! on the local filesystem, behind an HTTP server supporting Range
//! requests, or appended to the running executable
//! (`cat asset.zip >> app`).
//!
//! Entries stored without compression are exposed as seekable byte-range
//! views into the archive source, which is what a static-file server
//! needs to answer HTTP range requests. Compressed entries are exposed as
//! one-shot sequential decompression streams; seeking them fails
//! explicitly rather than silently.
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Read;
//! use std::path::Path;
//! use zipfs::ZipFs;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Falls back to an archive appended to the executable if the
//!     // file does not exist.
//!     let fs = ZipFs::init(Path::new("asset.zip"))?;
//!
//!     // List the (synthetic) root directory
//!     let mut root = fs.open("/")?;
//!     for child in root.read_dir(0)? {
//!         println!("{}", child.name());
//!     }
//!
//!     // Read a file
//!     let mut file = fs.open("/index.html")?;
//!     let mut contents = String::new();
//!     file.read_to_string(&mut contents)?;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod vfs;
pub mod zip;

pub use cli::Cli;
pub use io::{HttpRangeReader, LocalFileReader, ReadAt, SectionReader};
pub use vfs::{Handle, Metadata, VfsError, ZipFs};
pub use zip::{CompressionMethod, ZipEntry, ZipParser};
