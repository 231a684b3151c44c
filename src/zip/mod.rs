//! ZIP archive parsing.
//!
//! This module is the archive-loading side of the crate: it reads the
//! central directory of a ZIP archive and exposes each record as a
//! [`ZipEntry`], which the virtual filesystem in [`crate::vfs`] indexes.
//!
//! ## Architecture
//!
//! - `structures`: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - `parser`: Low-level parsing of ZIP structures from raw bytes, plus
//!   per-entry readers (verbatim for STORED, decompressing for DEFLATE)
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! This implementation reads the EOCD first (from the end of the file),
//! then the Central Directory, which allows listing files without reading
//! the entire archive - perfect for HTTP Range requests, and the reason
//! archives appended to another file (e.g. a self-serving executable)
//! parse without extra ceremony.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) method
//! - DEFLATE compression method
//! - Archives concatenated onto a host file (offset rebasing)
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod parser;
mod structures;

pub use parser::ZipParser;
pub use structures::*;
