//! In-memory archive builders for unit tests.
//!
//! All functions in this module panic on I/O errors.

#![allow(clippy::unwrap_used)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::{DeflateEncoder, GzEncoder};

/// Modification time stamped on tar entries.
pub const MTIME: u64 = 1_700_000_000;

/// 2024-03-15, stamped on zip entries.
pub const DOS_DATE: u16 = ((2024 - 1980) << 9) | (3 << 5) | 15;
/// 12:30:10, stamped on zip entries.
pub const DOS_TIME: u16 = (12 << 11) | (30 << 5) | 5;

/// Creates an in-memory tar archive of regular files with mode 0o644.
pub fn create_test_tar(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    entries
        .into_iter()
        .fold(TarTestBuilder::new(), |builder, (path, data)| {
            builder.add_file(path, data)
        })
        .build()
}

/// Gzip-compresses `data`.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Builder for tar archives with mixed entry types.
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_mtime(MTIME);
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    pub fn add_directory(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_mtime(MTIME);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        header.set_mtime(MTIME);
        header.set_link_name(target).unwrap();
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Adds the `pax_global_header` record GitHub puts first in tarballs.
    pub fn add_pax_global_header(mut self, records: &[u8]) -> Self {
        let mut header = tar::Header::new_ustar();
        header.set_entry_type(tar::EntryType::XGlobalHeader);
        header.set_size(records.len() as u64);
        header.set_mode(0o666);
        header.set_mtime(MTIME);
        header.set_cksum();
        self.builder
            .append_data(&mut header, "pax_global_header", records)
            .unwrap();
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

struct ZipTestEntry {
    name: String,
    data: Vec<u8>,
    method: u16,
    external_attrs: u32,
    zip64_size: Option<u64>,
}

/// Builder for zip archives written as if by a unix zip tool.
pub struct ZipTestBuilder {
    entries: Vec<ZipTestEntry>,
    comment: Vec<u8>,
}

impl ZipTestBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            comment: Vec::new(),
        }
    }

    pub fn add_file(self, name: &str, data: &[u8]) -> Self {
        self.push(name, data, 0, 0o100644 << 16)
    }

    pub fn add_file_with_mode(self, name: &str, data: &[u8], mode: u32) -> Self {
        self.push(name, data, 0, mode << 16)
    }

    pub fn add_deflated(self, name: &str, data: &[u8]) -> Self {
        self.push(name, data, 8, 0o100644 << 16)
    }

    /// Adds an entry declaring `method`, with `data` stored as is.
    pub fn add_with_method(self, name: &str, data: &[u8], method: u16) -> Self {
        self.push(name, data, method, 0o100644 << 16)
    }

    pub fn add_directory(self, name: &str) -> Self {
        self.push(name, b"", 0, (0o040755 << 16) | 0x10)
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Makes the last entry declare `size` as its uncompressed size through
    /// a ZIP64 extra field in the central directory.
    pub fn zip64_uncompressed_size(mut self, size: u64) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.zip64_size = Some(size);
        }
        self
    }

    fn push(mut self, name: &str, data: &[u8], method: u16, external_attrs: u32) -> Self {
        self.entries.push(ZipTestEntry {
            name: name.to_string(),
            data: data.to_vec(),
            method,
            external_attrs,
            zip64_size: None,
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let payload = if entry.method == 8 {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&entry.data).unwrap();
                encoder.finish().unwrap()
            } else {
                entry.data.clone()
            };
            let mut crc = flate2::Crc::new();
            crc.update(&entry.data);
            let offset = out.len() as u32;

            out.write_u32::<LittleEndian>(0x04034b50).unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(crc.sum()).unwrap();
            out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.data.len() as u32).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_all(entry.name.as_bytes()).unwrap();
            out.write_all(&payload).unwrap();

            central.write_u32::<LittleEndian>(0x02014b50).unwrap();
            central.write_u16::<LittleEndian>((3 << 8) | 20).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(entry.method).unwrap();
            central.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            central.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            central.write_u32::<LittleEndian>(crc.sum()).unwrap();
            central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            let extra = match entry.zip64_size {
                Some(size) => {
                    let mut extra = Vec::new();
                    extra.write_u16::<LittleEndian>(0x0001).unwrap();
                    extra.write_u16::<LittleEndian>(8).unwrap();
                    extra.write_u64::<LittleEndian>(size).unwrap();
                    extra
                }
                None => Vec::new(),
            };
            let declared = if entry.zip64_size.is_some() {
                0xFFFF_FFFF
            } else {
                entry.data.len() as u32
            };
            central.write_u32::<LittleEndian>(declared).unwrap();
            central.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(entry.external_attrs).unwrap();
            central.write_u32::<LittleEndian>(offset).unwrap();
            central.write_all(entry.name.as_bytes()).unwrap();
            central.write_all(&extra).unwrap();
        }

        let cd_offset = out.len() as u32;
        out.write_all(&central).unwrap();

        let count = self.entries.len() as u16;
        out.write_u32::<LittleEndian>(0x06054b50).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.write_all(&self.comment).unwrap();
        out
    }
}
