//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures over an
//! archive that is fully held in memory.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! The Central Directory is the authority on what the archive contains;
//! local headers are only consulted to locate file data.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{Error, Result};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// ZIP parser over an in-memory archive.
///
/// ## Example
///
/// ```ignore
/// let parser = ZipParser::new(&bytes);
/// for entry in parser.list_files()? {
///     let compressed = parser.compressed_data(&entry)?;
///     // Inflate according to entry.compression_method...
/// }
/// ```
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bounds-checked view of `len` bytes at `offset`.
    fn slice(&self, offset: u64, len: u64, what: &str) -> Result<&'a [u8]> {
        let start = usize::try_from(offset).ok();
        let end = offset.checked_add(len).and_then(|e| usize::try_from(e).ok());
        match (start, end) {
            (Some(start), Some(end)) if end <= self.data.len() => Ok(&self.data[start..end]),
            _ => Err(Error::InvalidArchive(format!(
                "{what} at offset {offset} runs past the end of the archive"
            ))),
        }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with comments
    /// by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the buffer).
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let size = self.data.len();
        if size < EndOfCentralDirectory::SIZE {
            return Err(Error::InvalidArchive("not a valid ZIP file".to_string()));
        }

        // Common case first: no comment, EOCD is the last 22 bytes.
        let offset = size - EndOfCentralDirectory::SIZE;
        let tail = &self.data[offset..];
        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
            let eocd = EndOfCentralDirectory::from_bytes(tail)?;
            return Ok((eocd, offset as u64));
        }

        // Search backwards for PK\x05\x06 whose comment length reaches
        // exactly to the end of the buffer.
        let search_start = size.saturating_sub(MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE);
        let window = &self.data[search_start..];
        for i in (0..=window.len() - EndOfCentralDirectory::SIZE).rev() {
            if &window[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                let comment_len = u16::from_le_bytes([window[i + 20], window[i + 21]]) as usize;
                if comment_len == window.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(&window[i..])?;
                    return Ok((eocd, (search_start + i) as u64));
                }
            }
        }

        Err(Error::InvalidArchive("not a valid ZIP file".to_string()))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD indicates ZIP64 extensions are needed
    /// (fields set to 0xFFFF or 0xFFFFFFFF).
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        // The ZIP64 EOCD Locator is located immediately before the regular EOCD
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| Error::InvalidArchive("missing ZIP64 locator".to_string()))?;
        let locator = Zip64EOCDLocator::from_bytes(self.slice(
            locator_offset,
            Zip64EOCDLocator::SIZE as u64,
            "ZIP64 locator",
        )?)?;

        Zip64EOCD::from_bytes(self.slice(
            locator.eocd64_offset,
            Zip64EOCD::MIN_SIZE as u64,
            "ZIP64 end of central directory",
        )?)
    }

    /// List all entries of the archive in Central Directory order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let cd_data = self.slice(cd_offset, cd_size, "central directory")?;

        // Every header takes at least CDFH_MIN_SIZE bytes, which bounds a
        // forged entry count.
        let capacity = total_entries.min((cd_data.len() / CDFH_MIN_SIZE) as u64);
        let mut entries = Vec::with_capacity(capacity as usize);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..total_entries {
            entries.push(self.parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        self.read_cdfh(cursor).map_err(|err| match err {
            Error::Io(io) => {
                Error::InvalidArchive(format!("truncated central directory header: {io}"))
            }
            other => other,
        })
    }

    fn read_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(Error::InvalidArchive(
                "invalid central directory file header".to_string(),
            ));
        }

        let version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

        // ZIP64 extended information lives in extra field 0x0001; each value
        // is present only if the matching header field is saturated.
        let extra_field_end = cursor.position() + extra_field_length as u64;
        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = cursor.position() + field_size as u64;

            if header_id == 0x0001 {
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
            }
            cursor.set_position(field_end);
        }

        cursor.set_position(extra_field_end + file_comment_length as u64);
        if cursor.position() > cursor.get_ref().len() as u64 {
            return Err(Error::InvalidArchive(format!(
                "central directory header for {file_name} is truncated"
            )));
        }

        Ok(ZipFileEntry {
            file_name,
            version_made_by,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            external_attrs,
        })
    }

    /// Get the offset where an entry's compressed data begins.
    ///
    /// The Local File Header has variable-length fields (filename, extra
    /// field) that may differ from the Central Directory entry, so they are
    /// re-read here.
    pub fn data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let lfh = self.slice(entry.lfh_offset, LFH_SIZE as u64, "local file header")?;
        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(Error::InvalidArchive(format!(
                "invalid local file header for {}",
                entry.file_name
            )));
        }

        let file_name_length = u16::from_le_bytes([lfh[26], lfh[27]]) as u64;
        let extra_field_length = u16::from_le_bytes([lfh[28], lfh[29]]) as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Raw (possibly compressed) bytes of an entry.
    pub fn compressed_data(&self, entry: &ZipFileEntry) -> Result<&'a [u8]> {
        let offset = self.data_offset(entry)?;
        self.slice(offset, entry.compressed_size, "file data")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::ZipTestBuilder;

    #[test]
    fn test_list_files_in_order() {
        let data = ZipTestBuilder::new()
            .add_directory("a/")
            .add_file("a/b.txt", b"hi")
            .add_deflated("c.txt", b"hello hello hello")
            .build();

        let entries = ZipParser::new(&data).list_files().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["a/", "a/b.txt", "c.txt"]);
        assert_eq!(entries[1].uncompressed_size, 2);
        assert_eq!(entries[2].compression_method, CompressionMethod::Deflate);
    }

    #[test]
    fn test_eocd_with_comment() {
        let data = ZipTestBuilder::new()
            .add_file("a.txt", b"a")
            .comment(b"built by tests")
            .build();

        let parser = ZipParser::new(&data);
        let (eocd, offset) = parser.find_eocd().unwrap();
        assert_eq!(eocd.comment_len, 14);
        assert_eq!(offset as usize, data.len() - 22 - 14);
        assert_eq!(parser.list_files().unwrap().len(), 1);
    }

    #[test]
    fn test_stored_data() {
        let data = ZipTestBuilder::new().add_file("a/b.txt", b"hi").build();
        let parser = ZipParser::new(&data);
        let entries = parser.list_files().unwrap();
        assert_eq!(parser.compressed_data(&entries[0]).unwrap(), b"hi");
    }

    #[test]
    fn test_not_a_zip() {
        let err = ZipParser::new(b"definitely not a zip archive")
            .list_files()
            .unwrap_err();
        assert!(err.is_container_format());

        let err = ZipParser::new(b"PK").list_files().unwrap_err();
        assert!(err.is_container_format());
    }

    #[test]
    fn test_central_directory_out_of_bounds() {
        let mut data = ZipTestBuilder::new().add_file("a.txt", b"a").build();
        let len = data.len();
        // Point the central directory offset past the end of the buffer.
        data[len - 6..len - 2].copy_from_slice(&0xFFFF_FFFEu32.to_le_bytes());

        let err = ZipParser::new(&data).list_files().unwrap_err();
        assert!(err.is_container_format());
    }

    #[test]
    fn test_truncated_central_directory() {
        let mut data = ZipTestBuilder::new().add_file("a.txt", b"a").build();
        let len = data.len();
        // Claim two entries while only one header is present.
        data[len - 12..len - 10].copy_from_slice(&2u16.to_le_bytes());

        let err = ZipParser::new(&data).list_files().unwrap_err();
        assert!(err.is_container_format());
    }
}
