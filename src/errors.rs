// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only configuration loading and method-graph construction can fail. Once a
//! [`crate::engine::SuiteRunner`] exists, every failure during the run is
//! converted into a ledger entry instead of an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Method '{method}' depends on '{target}', which matches nothing in this run")]
    UnknownDependency { method: String, target: String },

    #[error("Cycle detected in method dependencies: {0}")]
    DependencyCycle(String),

    #[error("Method '{0}' is not bound to a test class")]
    UnboundMethod(String),

    #[error("Cannot parse date '{value}' using pattern '{format}'")]
    InvalidDate { value: String, format: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SuiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_dependency_names_both_sides() {
        let err = SuiteError::UnknownDependency {
            method: "A.verify".to_string(),
            target: "A.missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("A.verify"));
        assert!(msg.contains("A.missing"));
    }
}
