use std::io::Read;

use flate2::read::DeflateDecoder;
use log::debug;

use crate::archive::{EntryKind, ExtractedFile, Extraction, FileMetadata};
use crate::error::{Error, Result};
use crate::matcher::Matcher;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// ZIP extractor over an in-memory archive
pub struct ZipExtractor<'a> {
    parser: ZipParser<'a>,
}

impl<'a> ZipExtractor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            parser: ZipParser::new(data),
        }
    }

    /// List all entries in the archive
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Inflate an entry's content into memory
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            return Err(Error::InvalidArchive(format!(
                "{} is encrypted, which is not supported",
                entry.file_name
            )));
        }

        // Declared sizes are not trusted for allocation; buffers grow with
        // the bytes actually present.
        let compressed = self.parser.compressed_data(entry)?;

        match entry.compression_method {
            CompressionMethod::Stored => Ok(compressed.to_vec()),
            CompressionMethod::Deflate => {
                let mut buf = Vec::new();
                DeflateDecoder::new(compressed)
                    .read_to_end(&mut buf)
                    .map_err(|err| {
                        Error::InvalidArchive(format!(
                            "failed to inflate {}: {err}",
                            entry.file_name
                        ))
                    })?;
                Ok(buf)
            }
            CompressionMethod::Unknown(_) => Err(Error::InvalidArchive(format!(
                "unsupported compression method {} for {}",
                entry.compression_method.as_u16(),
                entry.file_name
            ))),
        }
    }

    /// Buffer every non-directory entry accepted by `include`, keyed by its
    /// stored name.
    pub fn extract_matching<M>(&self, include: &M) -> Result<Extraction>
    where
        M: Matcher + ?Sized,
    {
        let mut files = Extraction::new();

        for entry in self.list_files()? {
            if entry.is_directory() || !include.matches(&entry.file_name) {
                continue;
            }

            debug!("downloading {}", entry.file_name);
            let data = self.extract_to_memory(&entry)?;
            files.insert(
                entry.file_name.clone(),
                ExtractedFile {
                    metadata: metadata(&entry),
                    path: entry.file_name,
                    data,
                },
            );
        }

        Ok(files)
    }
}

fn metadata(entry: &ZipFileEntry) -> FileMetadata {
    let mode = entry.unix_mode();
    let kind = match mode {
        Some(m) if m & S_IFMT == S_IFLNK => EntryKind::Symlink,
        _ => EntryKind::File,
    };

    FileMetadata {
        size: entry.uncompressed_size,
        mode,
        modified: entry.modified(),
        kind,
    }
}
