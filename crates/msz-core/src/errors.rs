//! Structured error types shared across the market sizing crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`MszError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (parameter names, offending values, etc.).
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

/// Canonical error type for the market sizing core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum MszError {
    /// Malformed or out-of-range scalar input.
    #[error("validation error: {0}")]
    Validation(ErrorInfo),
    /// Distribution tag that the sampler does not recognise.
    #[error("distribution error: {0}")]
    Distribution(ErrorInfo),
    /// Caller supplied formula failed to evaluate.
    #[error("formula error: {0}")]
    Formula(ErrorInfo),
    /// Computation graph structure errors.
    #[error("topology error: {0}")]
    Topology(ErrorInfo),
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

impl MszError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            MszError::Validation(info)
            | MszError::Distribution(info)
            | MszError::Formula(info)
            | MszError::Topology(info)
            | MszError::Serde(info) => info,
        }
    }

    /// Adds a context entry to whichever payload the error carries.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            MszError::Validation(info) => MszError::Validation(info.with_context(key, value)),
            MszError::Distribution(info) => MszError::Distribution(info.with_context(key, value)),
            MszError::Formula(info) => MszError::Formula(info.with_context(key, value)),
            MszError::Topology(info) => MszError::Topology(info.with_context(key, value)),
            MszError::Serde(info) => MszError::Serde(info.with_context(key, value)),
        }
    }

    /// Builds a validation failure naming the offending parameter and value.
    ///
    /// `requirement` completes the sentence "`parameter` must ...", e.g.
    /// `"be in (0, 1]"`.
    pub fn invalid_parameter(parameter: &str, value: f64, requirement: &str) -> Self {
        MszError::Validation(
            ErrorInfo::new(
                "invalid-parameter",
                format!("{parameter} must {requirement}, got {value}"),
            )
            .with_context("parameter", parameter)
            .with_context("value", value.to_string()),
        )
    }
}

/// Checks that `value` lies in the half-open unit interval `(0, 1]`.
pub fn require_unit_rate(parameter: &str, value: f64) -> Result<f64, MszError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(MszError::invalid_parameter(parameter, value, "be in (0, 1]"))
    }
}

/// Checks that `value` is finite and strictly positive.
pub fn require_positive(parameter: &str, value: f64) -> Result<f64, MszError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MszError::invalid_parameter(parameter, value, "be positive"))
    }
}
