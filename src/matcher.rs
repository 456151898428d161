//! Inclusion predicates applied to archive entry paths.

use log::warn;
use regex::Regex;

/// Decides whether an archive entry should be extracted.
///
/// Implementations must be pure: the same path always yields the same
/// answer, and calling [`matches`](Matcher::matches) never mutates shared
/// state, so one matcher can serve concurrent extractions.
pub trait Matcher: Send + Sync {
    /// Returns `true` if the entry at `path` should be kept.
    fn matches(&self, path: &str) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, path: &str) -> bool {
        self(path)
    }
}

/// Matches every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAll;

impl Matcher for MatchAll {
    fn matches(&self, _path: &str) -> bool {
        true
    }
}

/// Matches a path if any of its regular expressions finds a match in it.
///
/// Patterns are searched, not anchored: `\.md$` selects every markdown
/// file, `^docs/` everything under `docs`.
#[derive(Debug, Clone, Default)]
pub struct AnyOfPatterns {
    patterns: Vec<Regex>,
}

impl AnyOfPatterns {
    /// Compiles `patterns`.
    ///
    /// A pattern that does not compile is reported with a warning and left
    /// out, so it never matches while the remaining patterns still apply.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|p| match Regex::new(p.as_ref()) {
                Ok(re) => Some(re),
                Err(err) => {
                    warn!("unable to compile pattern {}: {}", p.as_ref(), err);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Number of patterns that compiled.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Matcher for AnyOfPatterns {
    fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }
}
