//! Provenance tags attached to every surfaced assumption.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, MszError};

/// Classifies where a number came from.
///
/// The marker strings are consumed verbatim by rendering collaborators and
/// must never change.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Provenance {
    /// Taken from a cited external source.
    Cited,
    /// Computed from other numbers.
    Derived,
    /// Unverified estimate.
    #[default]
    Estimated,
}

impl Provenance {
    /// All tags in rendering order.
    pub const ALL: [Provenance; 3] = [
        Provenance::Cited,
        Provenance::Derived,
        Provenance::Estimated,
    ];

    /// Fixed marker rendered next to the assumption.
    pub fn marker(&self) -> &'static str {
        match self {
            Provenance::Cited => "📚",
            Provenance::Derived => "🧮",
            Provenance::Estimated => "⚠️",
        }
    }

    /// Lowercase label used in serialized payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Provenance::Cited => "cited",
            Provenance::Derived => "derived",
            Provenance::Estimated => "estimated",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

impl FromStr for Provenance {
    type Err = MszError;

    /// Accepts either the marker or the lowercase label.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Provenance::ALL
            .into_iter()
            .find(|tag| tag.marker() == trimmed || tag.label() == trimmed)
            .ok_or_else(|| {
                MszError::Validation(
                    ErrorInfo::new(
                        "unknown-provenance",
                        format!("unrecognised provenance tag '{trimmed}'"),
                    )
                    .with_context("tag", trimmed)
                    .with_hint("use one of 📚/🧮/⚠️ or cited/derived/estimated"),
                )
            })
    }
}

impl TryFrom<String> for Provenance {
    type Error = MszError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Provenance> for String {
    fn from(tag: Provenance) -> Self {
        tag.label().to_string()
    }
}
