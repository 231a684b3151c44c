//! Shared fixtures: an in-memory ZIP writer and a memory-backed source.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use anyhow::Result;
use zipfs::ReadAt;

/// DOS timestamp used for every fixture entry: 2024-03-15 12:30:00.
pub const FIXTURE_DATE: u16 = ((2024 - 1980) << 9) | (3 << 5) | 15;
pub const FIXTURE_TIME: u16 = (12 << 11) | (30 << 5);

/// Minimal ZIP writer producing archives in memory.
///
/// Writes local file headers followed by a central directory and EOCD,
/// enough for the STORED and DEFLATE paths the crate reads.
pub struct ZipBuilder {
    data: Vec<u8>,
    central_dir: Vec<u8>,
    entries: u16,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            central_dir: Vec::new(),
            entries: 0,
        }
    }

    pub fn add_stored(&mut self, name: &str, contents: &[u8]) {
        self.add(name, contents, contents.to_vec(), 0, 0o100644, false);
    }

    /// Like [`ZipBuilder::add_stored`], but records sentinel sizes and
    /// offset in the central directory and carries the real values in a
    /// ZIP64 extended information extra field.
    pub fn add_stored_zip64(&mut self, name: &str, contents: &[u8]) {
        self.add(name, contents, contents.to_vec(), 0, 0o100644, true);
    }

    pub fn add_deflated(&mut self, name: &str, contents: &[u8]) {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents).unwrap();
        let compressed = encoder.finish().unwrap();
        self.add(name, contents, compressed, 8, 0o100644, false);
    }

    /// `name` must carry the conventional trailing slash.
    pub fn add_dir(&mut self, name: &str) {
        assert!(name.ends_with('/'));
        self.add(name, &[], Vec::new(), 0, 0o040755, false);
    }

    fn add(&mut self, name: &str, raw: &[u8], stored: Vec<u8>, method: u16, st_mode: u32, zip64: bool) {
        let lfh_offset = self.data.len() as u32;
        let crc = {
            let mut crc = flate2::Crc::new();
            crc.update(raw);
            crc.sum()
        };

        // Local file header
        self.data.extend_from_slice(b"PK\x03\x04");
        self.data.write_u16::<LittleEndian>(20).unwrap(); // version needed
        self.data.write_u16::<LittleEndian>(0).unwrap(); // flags
        self.data.write_u16::<LittleEndian>(method).unwrap();
        self.data.write_u16::<LittleEndian>(FIXTURE_TIME).unwrap();
        self.data.write_u16::<LittleEndian>(FIXTURE_DATE).unwrap();
        self.data.write_u32::<LittleEndian>(crc).unwrap();
        self.data
            .write_u32::<LittleEndian>(stored.len() as u32)
            .unwrap();
        self.data.write_u32::<LittleEndian>(raw.len() as u32).unwrap();
        self.data
            .write_u16::<LittleEndian>(name.len() as u16)
            .unwrap();
        self.data.write_u16::<LittleEndian>(0).unwrap(); // extra len
        self.data.extend_from_slice(name.as_bytes());
        self.data.extend_from_slice(&stored);

        // Central directory file header
        let cd = &mut self.central_dir;
        cd.extend_from_slice(b"PK\x01\x02");
        cd.write_u16::<LittleEndian>((3 << 8) | 20).unwrap(); // made by unix
        cd.write_u16::<LittleEndian>(20).unwrap(); // version needed
        cd.write_u16::<LittleEndian>(0).unwrap(); // flags
        cd.write_u16::<LittleEndian>(method).unwrap();
        cd.write_u16::<LittleEndian>(FIXTURE_TIME).unwrap();
        cd.write_u16::<LittleEndian>(FIXTURE_DATE).unwrap();
        cd.write_u32::<LittleEndian>(crc).unwrap();
        if zip64 {
            cd.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
            cd.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        } else {
            cd.write_u32::<LittleEndian>(stored.len() as u32).unwrap();
            cd.write_u32::<LittleEndian>(raw.len() as u32).unwrap();
        }
        cd.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        cd.write_u16::<LittleEndian>(if zip64 { 28 } else { 0 }).unwrap(); // extra len
        cd.write_u16::<LittleEndian>(0).unwrap(); // comment len
        cd.write_u16::<LittleEndian>(0).unwrap(); // disk number
        cd.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
        cd.write_u32::<LittleEndian>(st_mode << 16).unwrap(); // external attrs
        if zip64 {
            cd.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        } else {
            cd.write_u32::<LittleEndian>(lfh_offset).unwrap();
        }
        cd.extend_from_slice(name.as_bytes());
        if zip64 {
            // ZIP64 extended information: uncompressed size, compressed
            // size, local header offset
            cd.write_u16::<LittleEndian>(0x0001).unwrap();
            cd.write_u16::<LittleEndian>(24).unwrap();
            cd.write_u64::<LittleEndian>(raw.len() as u64).unwrap();
            cd.write_u64::<LittleEndian>(stored.len() as u64).unwrap();
            cd.write_u64::<LittleEndian>(lfh_offset as u64).unwrap();
        }

        self.entries += 1;
    }

    pub fn finish(self) -> Vec<u8> {
        self.finish_with_comment(b"")
    }

    pub fn finish_with_comment(mut self, comment: &[u8]) -> Vec<u8> {
        let cd_offset = self.data.len() as u32;
        let cd_size = self.central_dir.len() as u32;
        self.data.extend_from_slice(&self.central_dir);

        self.data.extend_from_slice(b"PK\x05\x06");
        self.data.write_u16::<LittleEndian>(0).unwrap(); // disk number
        self.data.write_u16::<LittleEndian>(0).unwrap(); // disk with cd
        self.data.write_u16::<LittleEndian>(self.entries).unwrap();
        self.data.write_u16::<LittleEndian>(self.entries).unwrap();
        self.data.write_u32::<LittleEndian>(cd_size).unwrap();
        self.data.write_u32::<LittleEndian>(cd_offset).unwrap();
        self.data
            .write_u16::<LittleEndian>(comment.len() as u16)
            .unwrap();
        self.data.extend_from_slice(comment);

        self.data
    }

    /// Finish with a ZIP64 tail: ZIP64 EOCD, locator, and a regular EOCD
    /// whose counts and offsets are all sentinels.
    pub fn finish_zip64(mut self) -> Vec<u8> {
        let cd_offset = self.data.len() as u64;
        let cd_size = self.central_dir.len() as u64;
        self.data.extend_from_slice(&self.central_dir);

        let eocd64_offset = self.data.len() as u64;
        self.data.extend_from_slice(b"PK\x06\x06");
        self.data.write_u64::<LittleEndian>(44).unwrap(); // record size after this field
        self.data.write_u16::<LittleEndian>((3 << 8) | 45).unwrap(); // made by unix
        self.data.write_u16::<LittleEndian>(45).unwrap(); // version needed
        self.data.write_u32::<LittleEndian>(0).unwrap(); // disk number
        self.data.write_u32::<LittleEndian>(0).unwrap(); // disk with cd
        self.data
            .write_u64::<LittleEndian>(self.entries as u64)
            .unwrap();
        self.data
            .write_u64::<LittleEndian>(self.entries as u64)
            .unwrap();
        self.data.write_u64::<LittleEndian>(cd_size).unwrap();
        self.data.write_u64::<LittleEndian>(cd_offset).unwrap();

        self.data.extend_from_slice(b"PK\x06\x07");
        self.data.write_u32::<LittleEndian>(0).unwrap(); // disk with eocd64
        self.data.write_u64::<LittleEndian>(eocd64_offset).unwrap();
        self.data.write_u32::<LittleEndian>(1).unwrap(); // total disks

        self.data.extend_from_slice(b"PK\x05\x06");
        self.data.write_u16::<LittleEndian>(0).unwrap(); // disk number
        self.data.write_u16::<LittleEndian>(0).unwrap(); // disk with cd
        self.data.write_u16::<LittleEndian>(0xFFFF).unwrap();
        self.data.write_u16::<LittleEndian>(0xFFFF).unwrap();
        self.data.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        self.data.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        self.data.write_u16::<LittleEndian>(0).unwrap(); // comment len
        self.data
    }
}

/// In-memory [`ReadAt`] source.
pub struct MemReader(Vec<u8>);

impl MemReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl ReadAt for MemReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.0.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.0.len() - start);
        buf[..n].copy_from_slice(&self.0[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.0.len() as u64
    }
}
