//! Structured error types shared across framegen crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`FramegenError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (case ids, paths, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the framegen pipeline.
///
/// Configuration-class failures (`Bucket`, `Plan`) must propagate to the
/// caller unmodified; batch orchestration catches the per-item families
/// (`Graph`, `Report`) and aggregates them into summaries instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum FramegenError {
    /// Shard allocation errors (out-of-range case ids, bad shard geometry).
    #[error("bucket error: {0}")]
    Bucket(ErrorInfo),
    /// Plan persistence and parsing errors.
    #[error("plan error: {0}")]
    Plan(ErrorInfo),
    /// Design-space sampling errors.
    #[error("sampler error: {0}")]
    Sampler(ErrorInfo),
    /// Graph construction and artifact export errors.
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Missing-case report discovery and parsing errors.
    #[error("report error: {0}")]
    Report(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl FramegenError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            FramegenError::Bucket(info)
            | FramegenError::Plan(info)
            | FramegenError::Sampler(info)
            | FramegenError::Graph(info)
            | FramegenError::Report(info)
            | FramegenError::Serde(info) => info,
        }
    }
}
