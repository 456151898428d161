//! ZIP archive parsing and extraction.
//!
//! Zip needs random access to its Central Directory, so the whole archive is
//! buffered before parsing. Entry names are used exactly as stored: no
//! leading segments are stripped.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: Entry filtering and decompression into memory
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) and DEFLATE compression methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods
//! - CRC-32 values are not verified

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;

use crate::archive::Extraction;
use crate::error::Result;
use crate::matcher::Matcher;

/// Extracts the entries of an in-memory zip archive selected by `include`.
pub fn extract<M>(data: &[u8], include: &M) -> Result<Extraction>
where
    M: Matcher + ?Sized,
{
    ZipExtractor::new(data).extract_matching(include)
}
