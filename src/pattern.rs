// src/pattern.rs

//! Full-match name patterns used for group selection and dependency
//! resolution.

use std::fmt;

use regex::Regex;

use crate::errors::{Result, SuiteError};

/// A group or method name pattern, matched against the *whole* candidate.
#[derive(Clone)]
pub enum NamePattern {
    Regex { source: String, regex: Regex },
    /// Fallback for lenient construction when the source is not a valid
    /// regex.
    Exact(String),
}

impl NamePattern {
    /// Compile `source` as a regex anchored at both ends.
    pub fn strict(source: &str) -> Result<Self> {
        let regex = Regex::new(&anchored(source)).map_err(|e| SuiteError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        })?;
        Ok(NamePattern::Regex {
            source: source.to_string(),
            regex,
        })
    }

    /// Like [`NamePattern::strict`], but falls back to exact comparison when
    /// `source` does not compile.
    pub fn lenient(source: &str) -> Self {
        Self::strict(source).unwrap_or_else(|_| NamePattern::Exact(source.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            NamePattern::Regex { source, .. } => source,
            NamePattern::Exact(s) => s,
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            NamePattern::Regex { regex, .. } => regex.is_match(candidate),
            NamePattern::Exact(s) => s == candidate,
        }
    }
}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamePattern").field(&self.as_str()).finish()
    }
}

fn anchored(source: &str) -> String {
    format!("^(?:{source})$")
}

/// Compile every pattern, failing on the first invalid one.
pub fn compile_all<'a>(sources: impl IntoIterator<Item = &'a String>) -> Result<Vec<NamePattern>> {
    sources.into_iter().map(|s| NamePattern::strict(s)).collect()
}

/// `true` if any pattern matches `candidate`.
pub fn any_matches(patterns: &[NamePattern], candidate: &str) -> bool {
    patterns.iter().any(|p| p.matches(candidate))
}
