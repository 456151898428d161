//! Leading-segment stripping for tar entry paths.

/// Number of leading path segments dropped from tar entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StripDepth(pub usize);

impl StripDepth {
    /// Keep entry names unchanged.
    pub const NONE: Self = Self(0);

    /// Drop the `<owner>-<repo>-<sha>/` directory GitHub wraps tarballs in.
    pub const REPOSITORY_TARBALL: Self = Self(1);

    /// Computes the lookup key for `raw`.
    ///
    /// The name is split on `/` into at most `depth + 1` pieces and the last
    /// piece is returned whole, so `a/b/c/d` at depth 1 becomes `b/c/d`.
    /// Returns `None` when the name has no more than `depth` segments.
    pub fn resolve(self, raw: &str) -> Option<&str> {
        if self.0 == 0 {
            return Some(raw);
        }
        raw.splitn(self.0 + 1, '/').nth(self.0)
    }
}

impl From<usize> for StripDepth {
    fn from(depth: usize) -> Self {
        Self(depth)
    }
}

impl std::fmt::Display for StripDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
