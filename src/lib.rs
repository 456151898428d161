//! # ghextract
//!
//! Fetch a selected subset of files from GitHub repository tarballs and
//! workflow run artifacts, entirely in memory.
//!
//! The container format of a downloaded body is chosen from its declared
//! `Content-Type`: gzip-compressed tar, zip, or uncompressed tar. Entries are
//! streamed, filtered by a [`Matcher`] and, for tarballs, stripped of a fixed
//! number of leading path segments. Directories never appear in the result.
//!
//! ## Features
//!
//! - Content-type driven dispatch between tar.gz, zip and raw tar
//! - Regex based selection of repository files ([`AnyOfPatterns`])
//! - Support for ZIP64 archives, STORED and DEFLATE entries
//! - Repository tarball and workflow artifact retrieval ([`GitHub`])
//!
//! ## Example
//!
//! ```no_run
//! use ghextract::{AnyOfPatterns, GitHub};
//!
//! #[tokio::main]
//! async fn main() -> ghextract::Result<()> {
//!     let github = GitHub::from_env()?;
//!
//!     let include = AnyOfPatterns::new([r"^\.github/workflows/"]);
//!     if let Some(files) = github
//!         .download_selected_repository_files("octocat", "hello-world", "main", &include)
//!         .await
//!     {
//!         for (path, file) in &files {
//!             println!("{path}: {} bytes", file.data.len());
//!         }
//!     }
//!
//!     let coverage = github.download_artifact("coverage").await?;
//!     println!("{} files in artifact", coverage.len());
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod github;
pub mod io;
pub mod matcher;
pub mod path;
mod tar_stream;
pub mod zip;

#[cfg(test)]
mod test_utils;

pub use archive::{ArchiveFormat, EntryKind, ExtractedFile, Extraction, FileMetadata, extract};
pub use cli::Cli;
pub use error::{Error, Result};
pub use github::{Config, GitHub};
pub use io::{HttpTransport, Transport};
pub use matcher::{AnyOfPatterns, MatchAll, Matcher};
pub use path::StripDepth;
