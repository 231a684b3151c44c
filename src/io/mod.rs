mod http;
mod local;
mod section;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;
pub use section::SectionReader;

use anyhow::{Result, bail};

/// Trait for random access reading from a data source.
///
/// Implementations must support concurrent, independent reads at arbitrary
/// offsets: the virtual filesystem hands out many handles that all read
/// through one shared source, each at its own position.
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Read until the buffer is full, failing on a short source.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                bail!(
                    "unexpected end of data at offset {} (wanted {} more bytes)",
                    offset + filled as u64,
                    buf.len() - filled
                );
            }
            filled += n;
        }
        Ok(())
    }
}
