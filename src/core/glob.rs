//! Glob patterns for tool search.
//!
//! Supported syntax:
//! - `*` - any run of characters except `/`
//! - `**` - any run of characters, including `/`
//! - `?` - a single character except `/`
//!
//! Everything else matches literally. Matching is case-insensitive and
//! anchored to the whole candidate string.

use regex::{Regex, RegexBuilder};

/// Translate a glob pattern into an anchored regex source string.
///
/// An empty pattern matches everything.
pub fn glob_to_regex(pattern: &str) -> String {
    if pattern.is_empty() {
        return "^.*$".to_string();
    }

    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    regex.push_str(".*");
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            other => {
                let mut buf = [0u8; 4];
                regex.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }

    regex.push('$');
    regex
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;
        Ok(Self { source: pattern.to_string(), regex })
    }

    /// The original glob text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether the whole candidate matches.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation() {
        assert_eq!(glob_to_regex("read_*"), "^read_[^/]*$");
        assert_eq!(glob_to_regex("**"), "^.*$");
        assert_eq!(glob_to_regex("a?c"), "^a[^/]c$");
        assert_eq!(glob_to_regex("a.b"), r"^a\.b$");
    }

    #[test]
    fn test_star_stays_within_segment() {
        let glob = GlobPattern::new("github/*").unwrap();
        assert!(glob.is_match("github/create_issue"));
        assert!(!glob.is_match("github/nested/tool"));

        let deep = GlobPattern::new("github/**").unwrap();
        assert!(deep.is_match("github/nested/tool"));
    }

    #[test]
    fn test_case_insensitive_and_anchored() {
        let glob = GlobPattern::new("*file*").unwrap();
        assert!(glob.is_match("read_FILE"));
        assert!(glob.is_match("file"));

        let exact = GlobPattern::new("file").unwrap();
        assert!(!exact.is_match("read_file"));
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        let glob = GlobPattern::new("").unwrap();
        assert!(glob.is_match(""));
        assert!(glob.is_match("anything/at all"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let glob = GlobPattern::new("a+b(c)").unwrap();
        assert!(glob.is_match("a+b(c)"));
        assert!(!glob.is_match("aab(c)"));
    }
}
