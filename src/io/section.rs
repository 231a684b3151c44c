use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use super::ReadAt;

/// A bounded, independently-seekable view into a shared [`ReadAt`] source.
///
/// Each section owns only its own position; many sections over the same
/// source can read concurrently. Seeking past the end is allowed (reads
/// there return 0), seeking before the start is an error.
pub struct SectionReader<R: ReadAt> {
    source: Arc<R>,
    start: u64,
    len: u64,
    pos: u64,
}

impl<R: ReadAt> SectionReader<R> {
    /// Create a section covering `len` bytes starting at `start` in `source`.
    pub fn new(source: Arc<R>, start: u64, len: u64) -> Self {
        Self {
            source,
            start,
            len,
            pos: 0,
        }
    }

    /// Length of the section in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the section is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<R: ReadAt> Read for SectionReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len {
            return Ok(0);
        }
        let remaining = (self.len - self.pos) as usize;
        let want = buf.len().min(remaining);
        let n = self
            .source
            .read_at(self.start + self.pos, &mut buf[..want])
            .map_err(io::Error::other)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: ReadAt> Seek for SectionReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => apply_delta(self.pos, delta),
            SeekFrom::End(delta) => apply_delta(self.len, delta),
        };
        match target {
            Some(target) => {
                self.pos = target;
                Ok(target)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek out of range",
            )),
        }
    }
}

fn apply_delta(base: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        base.checked_add(delta as u64)
    } else {
        base.checked_sub(delta.unsigned_abs())
    }
}
