//! Forward-only extraction of tar streams.

use std::io::Read;
use std::time::{Duration, SystemTime};

use log::{debug, warn};
use tar::{Archive, EntryType, Header};

use crate::archive::{EntryKind, ExtractedFile, Extraction, FileMetadata};
use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::path::StripDepth;

/// Reads `reader` as a tar stream and buffers the entries selected by `include`.
pub fn extract<R, M>(reader: R, strip: StripDepth, include: &M) -> Result<Extraction>
where
    R: Read,
    M: Matcher + ?Sized,
{
    let mut archive = Archive::new(reader);
    let mut files = Extraction::new();

    for entry in archive.entries().map_err(Error::from_tar)? {
        let mut entry = entry.map_err(Error::from_tar)?;
        let header = entry.header();
        if is_metadata_only(header.entry_type()) {
            continue;
        }

        let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if is_directory(header, &raw_name) {
            continue;
        }

        let Some(name) = strip.resolve(&raw_name) else {
            warn!(
                "skipping {raw_name} from tarball, it is below the stripped folder level {strip}"
            );
            continue;
        };
        if !include.matches(name) {
            continue;
        }

        debug!("downloading {raw_name}");
        let metadata = metadata(entry.header());
        // The declared size is only an upper bound on what the stream holds.
        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(Error::from_tar)?;

        let name = name.to_string();
        files.insert(
            name.clone(),
            ExtractedFile {
                path: name,
                metadata,
                data,
            },
        );
    }

    Ok(files)
}

/// Extended header records describe the entry that follows them and carry
/// no file content of their own.
fn is_metadata_only(entry_type: EntryType) -> bool {
    entry_type.is_pax_global_extensions()
        || entry_type.is_pax_local_extensions()
        || entry_type.is_gnu_longname()
        || entry_type.is_gnu_longlink()
}

/// Pre-POSIX archives mark directories with a trailing slash on an entry
/// whose type flag is NUL; any other type flag is taken at its word.
fn is_directory(header: &Header, name: &str) -> bool {
    header.entry_type().is_dir() || (header.as_old().linkflag[0] == b'\0' && name.ends_with('/'))
}

fn metadata(header: &Header) -> FileMetadata {
    let entry_type = header.entry_type();
    let kind = if entry_type.is_file() {
        EntryKind::File
    } else if entry_type.is_symlink() {
        EntryKind::Symlink
    } else if entry_type.is_hard_link() {
        EntryKind::Hardlink
    } else {
        EntryKind::Other
    };

    FileMetadata {
        size: header.size().unwrap_or(0),
        mode: header.mode().ok(),
        modified: header
            .mtime()
            .ok()
            .and_then(|secs| SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(secs))),
        kind,
    }
}
