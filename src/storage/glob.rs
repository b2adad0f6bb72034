//! Glob patterns for object keys
//!
//! `*` and `?` never cross a `/`; `**` matches any number of segments.

use crate::error::{Error, Result};
use regex::Regex;

/// Compiled glob pattern
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
    literal_prefix: String,
}

impl Glob {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim_matches('/');
        if pattern.is_empty() {
            return Err(Error::config("Empty glob pattern"));
        }

        let mut regex = String::from("^");
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    // `**/` also matches zero directories
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        regex.push_str("(?:.*/)?");
                    } else {
                        regex.push_str(".*");
                    }
                }
                '*' => regex.push_str("[^/]*"),
                '?' => regex.push_str("[^/]"),
                other => regex.push_str(&regex::escape(&other.to_string())),
            }
        }
        regex.push('$');

        let regex = Regex::new(&regex)
            .map_err(|e| Error::config(format!("Invalid glob '{pattern}': {e}")))?;

        // Directory segments before the first wildcard bound the listing
        let literal_prefix = pattern
            .split('/')
            .take_while(|segment| !segment.contains(&['*', '?'][..]))
            .collect::<Vec<_>>();
        let literal_prefix = if literal_prefix.len() == pattern.split('/').count() {
            // No wildcard at all: list the parent directory
            literal_prefix[..literal_prefix.len() - 1].join("/")
        } else {
            literal_prefix.join("/")
        };

        Ok(Self {
            regex,
            literal_prefix,
        })
    }

    /// Whether a relative key matches
    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Leading directories without wildcards
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }
}
