// src/config/validate.rs

use regex::Regex;
use tokio::sync::Semaphore;

use crate::config::model::{RawRunConfig, RunConfig};
use crate::errors::{Result, SuiteError};

impl TryFrom<RawRunConfig> for RunConfig {
    type Error = SuiteError;

    fn try_from(raw: RawRunConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(RunConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawRunConfig) -> Result<()> {
    validate_run_section(cfg)?;
    validate_patterns(cfg)?;
    validate_meta_groups(cfg)?;
    Ok(())
}

fn validate_run_section(cfg: &RawRunConfig) -> Result<()> {
    if cfg.run.thread_count == 0 {
        return Err(SuiteError::ConfigError(
            "[run].thread_count must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.run.thread_count > Semaphore::MAX_PERMITS {
        return Err(SuiteError::ConfigError(format!(
            "[run].thread_count must be <= {} (got {})",
            Semaphore::MAX_PERMITS,
            cfg.run.thread_count
        )));
    }
    if cfg.run.name.trim().is_empty() {
        return Err(SuiteError::ConfigError(
            "[run].name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawRunConfig) -> Result<()> {
    let groups = &cfg.groups;
    let all = groups
        .include
        .iter()
        .chain(groups.exclude.iter())
        .chain(groups.include_methods.iter())
        .chain(groups.exclude_methods.iter());

    for pattern in all {
        Regex::new(pattern).map_err(|source| SuiteError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
    }
    Ok(())
}

fn validate_meta_groups(cfg: &RawRunConfig) -> Result<()> {
    for (name, members) in cfg.meta_groups.iter() {
        if name.trim().is_empty() {
            return Err(SuiteError::ConfigError(
                "[meta_groups] contains an empty group name".to_string(),
            ));
        }
        if members.iter().any(|m| m.trim().is_empty()) {
            return Err(SuiteError::ConfigError(format!(
                "meta-group '{name}' lists an empty member"
            )));
        }
    }
    Ok(())
}
