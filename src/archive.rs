//! Content-type driven archive extraction.
//!
//! An HTTP response body is handed over together with its declared
//! `Content-Type`. The declared type alone picks the container format; bytes
//! are never sniffed. Entries are filtered by a [`Matcher`] and only the
//! selected ones are buffered in memory.
//!
//! | Content-Type                              | Format                  |
//! |-------------------------------------------|-------------------------|
//! | `application/gzip`, `application/x-gzip`  | gzip-compressed tar     |
//! | `application/zip`                         | zip (buffered in full)  |
//! | anything else, or absent                  | uncompressed tar        |

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::time::SystemTime;

use flate2::bufread::MultiGzDecoder;
use log::debug;

use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::path::StripDepth;
use crate::{tar_stream, zip};

/// Gzip member header magic (RFC 1952).
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Container format chosen from a declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar stream.
    GzipTar,
    /// Zip archive.
    Zip,
    /// Uncompressed tar stream.
    RawTar,
}

impl ArchiveFormat {
    /// Maps a `Content-Type` value to a format, defaulting to [`RawTar`](Self::RawTar).
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type {
            "application/gzip" | "application/x-gzip" => Self::GzipTar,
            "application/zip" => Self::Zip,
            _ => Self::RawTar,
        }
    }
}

/// Kind of a non-directory entry kept in an [`Extraction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Symlink,
    Hardlink,
    Other,
}

/// Metadata carried over from the archive entry header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Uncompressed size in bytes, as declared by the header.
    pub size: u64,
    /// Unix mode bits, when the format records them.
    pub mode: Option<u32>,
    /// Last modification time, when the format records one.
    pub modified: Option<SystemTime>,
    pub kind: EntryKind,
}

/// One archive entry that passed filtering, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Effective path, after stripping.
    pub path: String,
    pub metadata: FileMetadata,
    pub data: Vec<u8>,
}

/// Extracted files keyed by effective path.
///
/// When two entries resolve to the same path the one read last wins.
pub type Extraction = HashMap<String, ExtractedFile>;

/// Extracts the entries of `stream` selected by `include`.
///
/// `strip` applies to tar entries only; zip entries keep their stored names.
/// Any read, decompression or container error aborts the whole call and no
/// partial result is returned.
///
/// # Errors
///
/// Returns [`Error::Decoder`] when a gzip stream does not start with a gzip
/// header, [`Error::InvalidArchive`] for corrupted containers and
/// [`Error::Io`] when the stream itself fails.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use ghextract::{extract, MatchAll, StripDepth};
///
/// # fn main() -> ghextract::Result<()> {
/// let mut builder = tar::Builder::new(Vec::new());
/// let mut header = tar::Header::new_gnu();
/// header.set_size(2);
/// header.set_mode(0o644);
/// header.set_cksum();
/// builder.append_data(&mut header, "repo-sha/hello.txt", &b"hi"[..])?;
/// let bytes = builder.into_inner()?;
///
/// let files = extract(Cursor::new(bytes), "", StripDepth::REPOSITORY_TARBALL, &MatchAll)?;
/// assert_eq!(files["hello.txt"].data, b"hi");
/// # Ok(())
/// # }
/// ```
pub fn extract<R, M>(
    stream: R,
    content_type: &str,
    strip: StripDepth,
    include: &M,
) -> Result<Extraction>
where
    R: Read,
    M: Matcher + ?Sized,
{
    let format = ArchiveFormat::from_content_type(content_type);
    debug!("extracting {format:?} archive (content type {content_type:?}, strip {strip})");

    match format {
        ArchiveFormat::GzipTar => {
            let mut reader = BufReader::new(stream);
            check_gzip_header(&mut reader)?;
            tar_stream::extract(MultiGzDecoder::new(reader), strip, include)
        }
        ArchiveFormat::Zip => {
            let mut stream = stream;
            let mut data = Vec::new();
            stream.read_to_end(&mut data)?;
            debug!("buffered {} bytes of zip data", data.len());
            zip::extract(&data, include)
        }
        ArchiveFormat::RawTar => tar_stream::extract(stream, strip, include),
    }
}

/// Fails early on a body that is not gzip at all.
fn check_gzip_header<R: BufRead>(reader: &mut R) -> Result<()> {
    let head = reader.fill_buf()?;
    if head.len() < GZIP_MAGIC.len() || head[..GZIP_MAGIC.len()] != GZIP_MAGIC {
        return Err(Error::Decoder("invalid gzip header".to_string()));
    }
    Ok(())
}
