// src/exec/skip.rs

//! Skip requests, optionally time-bombed.

use chrono::{NaiveDate, Utc};

use crate::errors::{Result, SuiteError};
use crate::types::{FailureKind, ResultStatus};

/// Date format used when a skip does not name its own.
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d";

/// A skip reported by an invoked method.
///
/// Without an expiry the skip is always honoured. With one, it is honoured
/// up to and including the expiry date; after that the same skip is
/// recorded as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipCondition {
    reason: String,
    expiry: Option<(NaiveDate, String)>,
}

impl SkipCondition {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            expiry: None,
        }
    }

    /// Skip until `date`, parsed with `format` (default
    /// [`DEFAULT_DATE_FORMAT`]).
    pub fn until(reason: impl Into<String>, date: &str, format: Option<&str>) -> Result<Self> {
        let format = format.unwrap_or(DEFAULT_DATE_FORMAT);
        let parsed =
            NaiveDate::parse_from_str(date, format).map_err(|_| SuiteError::InvalidDate {
                value: date.to_string(),
                format: format.to_string(),
            })?;
        Ok(Self {
            reason: reason.into(),
            expiry: Some((parsed, format.to_string())),
        })
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry.as_ref().map(|(date, _)| *date)
    }

    /// Whether the skip still holds on `today`.
    pub fn is_skip(&self, today: NaiveDate) -> bool {
        match &self.expiry {
            None => true,
            Some((expiry, _)) => today <= *expiry,
        }
    }

    /// Classify the skip as of `today`.
    pub fn resolve(&self, today: NaiveDate) -> ResolvedSkip {
        match &self.expiry {
            Some((expiry, format)) if today > *expiry => ResolvedSkip {
                status: ResultStatus::Failed,
                failure: FailureKind::SkipExpired,
                message: format!(
                    "{}; Test must have been enabled by: {}",
                    self.reason,
                    expiry.format(format)
                ),
            },
            _ => ResolvedSkip {
                status: ResultStatus::Skipped,
                failure: FailureKind::SkipRequested,
                message: self.reason.clone(),
            },
        }
    }

    /// Classify the skip as of the current UTC date.
    pub fn resolve_now(&self) -> ResolvedSkip {
        self.resolve(Utc::now().date_naive())
    }
}

/// A skip after its expiry has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSkip {
    pub status: ResultStatus,
    pub failure: FailureKind,
    pub message: String,
}
