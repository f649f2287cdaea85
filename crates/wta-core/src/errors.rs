//! Structured error types shared across the sweep crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`SweepError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, axis names, run names).
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

/// Canonical error type for sweep planning and dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SweepError {
    /// Invalid or inconsistent sweep configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Axis definition and product errors.
    #[error("axis error: {0}")]
    Axis(ErrorInfo),
    /// Values that cannot be embedded in a run name.
    #[error("naming error: {0}")]
    Naming(ErrorInfo),
    /// Trace root scanning failures.
    #[error("discovery error: {0}")]
    Discovery(ErrorInfo),
    /// Output root preparation failures.
    #[error("workspace error: {0}")]
    Workspace(ErrorInfo),
    /// Simulator build step failures.
    #[error("build error: {0}")]
    Build(ErrorInfo),
    /// External process launch and exit failures.
    #[error("dispatch error: {0}")]
    Dispatch(ErrorInfo),
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

impl SweepError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SweepError::Config(info)
            | SweepError::Axis(info)
            | SweepError::Naming(info)
            | SweepError::Discovery(info)
            | SweepError::Workspace(info)
            | SweepError::Build(info)
            | SweepError::Dispatch(info)
            | SweepError::Serde(info) => info,
        }
    }

    /// Stable error code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }
}
