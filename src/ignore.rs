//! Ignore rules for scan and verify.
//!
//! The ignore set is the union of the workspace `.provmarkignore` file, any
//! extra patterns from configuration, and the built-in defaults. Signing and
//! verification must build the matcher the same way or the recomputed content
//! hash will not line up.

use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Built-in ignore patterns: version control, tool metadata, dependency cache,
/// OS metadata, and the manifest files themselves.
pub const BUILTIN_DEFAULTS: &[&str] = &[".git", ".provmark", "node_modules", ".DS_Store", "*.pmk"];

/// Name of the per-workspace ignore file.
pub const IGNORE_FILE_NAME: &str = ".provmarkignore";

#[derive(Debug, Clone)]
struct IgnorePattern {
    raw: String,
    segments: Vec<String>,
    glob: Option<GlobMatcher>,
}

impl IgnorePattern {
    fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        let glob = match GlobBuilder::new(trimmed).literal_separator(true).build() {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                warn!(pattern = trimmed, error = %e, "Invalid glob; matching literally");
                None
            }
        };
        Some(Self {
            raw: trimmed.to_string(),
            segments: trimmed.split('/').map(str::to_string).collect(),
            glob,
        })
    }

    fn matches(&self, path: &str, segments: &[&str]) -> bool {
        if let Some(glob) = &self.glob {
            if glob.is_match(path) {
                return true;
            }
        }

        // Directory-name ignore: the pattern appears as a run of whole segments.
        if self.segments.len() <= segments.len() {
            let hit = segments
                .windows(self.segments.len())
                .any(|w| w.iter().zip(&self.segments).all(|(a, b)| *a == b.as_str()));
            if hit {
                return true;
            }
        }

        segments.last().is_some_and(|name| *name == self.raw)
    }
}

/// Decides whether a root-relative, slash-separated path is excluded.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreMatcher {
    /// Build a matcher from user patterns, always unioned with [`BUILTIN_DEFAULTS`].
    pub fn new<I, S>(user_patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = user_patterns
            .into_iter()
            .filter_map(|p| IgnorePattern::new(p.as_ref()))
            .chain(BUILTIN_DEFAULTS.iter().filter_map(|p| IgnorePattern::new(p)))
            .collect();
        Self { patterns }
    }

    /// Build the matcher for a scan root: `.provmarkignore` + `extra` + defaults.
    pub fn for_root(root: &Path, extra: &[String]) -> Self {
        let mut user = read_ignore_file(root);
        user.extend(extra.iter().cloned());
        Self::new(user)
    }

    /// Effective pattern list, user patterns first.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.raw.as_str())
    }

    /// True if `rel_path` should not be scanned. The empty path is the root
    /// and is never ignored.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        if rel_path.is_empty() {
            return false;
        }
        let segments: Vec<&str> = rel_path.split('/').filter(|s| !s.is_empty()).collect();

        if segments.last().is_some_and(|name| name.starts_with('.')) {
            return true;
        }

        self.patterns.iter().any(|p| p.matches(rel_path, &segments))
    }
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

/// Parse ignore-file contents: trim, skip empty lines and `#` comments.
pub fn parse_ignore_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read `<root>/.provmarkignore`. A missing or unreadable file yields no patterns.
pub fn read_ignore_file(root: &Path) -> Vec<String> {
    let path = root.join(IGNORE_FILE_NAME);
    if !path.is_file() {
        return Vec::new();
    }
    match fs::read_to_string(&path) {
        Ok(contents) => {
            let patterns = parse_ignore_lines(&contents);
            debug!(path = %path.display(), count = patterns.len(), "Loaded ignore file");
            patterns
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read ignore file");
            Vec::new()
        }
    }
}
