//! Error types for archive retrieval and extraction.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a retrieval or an extraction.
///
/// Malformed inclusion patterns and tar entries sitting above the strip
/// level are not errors: they are logged and skipped.
#[derive(Error, Debug)]
pub enum Error {
    /// The archive stream could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The decoder for the declared format could not be set up.
    #[error("failed to open decoder: {0}")]
    Decoder(String),

    /// The zip or tar structure is corrupted.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// The HTTP request could not be performed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an unexpected status code.
    #[error("unexpected status {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code returned.
        status: u16,
    },

    /// An artifact download did not answer with a redirect.
    #[error("no download location returned for {0}")]
    MissingRedirect(String),

    /// The API returned a body that could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// The repository is not in `owner/name` form.
    #[error("invalid repository {0:?}, expected owner/name")]
    InvalidRepository(String),

    /// No artifact with the requested name exists for the run.
    #[error("unable to find artifact named {name} for run {run_id} on repository {repository}")]
    ArtifactNotFound {
        /// Requested artifact name.
        name: String,
        /// Workflow run searched.
        run_id: u64,
        /// Repository searched, as `owner/name`.
        repository: String,
    },
}

impl Error {
    /// Returns `true` if the bytes could not be read or decoded at all.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Decoder(_) | Self::Http(_))
    }

    /// Returns `true` if the container itself is malformed.
    #[must_use]
    pub const fn is_container_format(&self) -> bool {
        matches!(self, Self::InvalidArchive(_))
    }

    /// Classifies an error raised while walking a tar stream.
    ///
    /// The `tar` crate reports its own structural failures with
    /// [`std::io::ErrorKind::Other`]; every other kind comes from the
    /// underlying reader or decompressor.
    pub(crate) fn from_tar(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::Other {
            Self::InvalidArchive(format!("failed to read tar entry: {err}"))
        } else {
            Self::Io(err)
        }
    }
}
