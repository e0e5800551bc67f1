//! Named assumptions and the ordered sets they are compiled from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, MszError};
use crate::provenance::Provenance;

/// Key fragments that mark an assumption as a ratio in `(0, 1]`.
const RATIO_HINTS: [&str; 6] = ["rate", "pct", "ratio", "share", "adopt", "cagr"];

/// Single named input to an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    /// Stable identifier, unique within a set.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Value used in computation.
    pub numeric_value: f64,
    /// Value as it should be displayed (e.g. `"85%"`).
    #[serde(default)]
    pub display_value: String,
    /// Unit of `numeric_value`.
    #[serde(default)]
    pub unit: String,
    /// Where the number came from.
    #[serde(default)]
    pub provenance: Provenance,
    /// Free-text tag naming where the assumption is used.
    #[serde(default)]
    pub used_in: String,
}

impl Assumption {
    /// Creates an estimated assumption whose display value mirrors the number.
    pub fn new(key: impl Into<String>, name: impl Into<String>, numeric_value: f64) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            numeric_value,
            display_value: numeric_value.to_string(),
            unit: String::new(),
            provenance: Provenance::default(),
            used_in: String::new(),
        }
    }

    /// Sets the provenance tag.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the display value.
    pub fn with_display(mut self, display_value: impl Into<String>) -> Self {
        self.display_value = display_value.into();
        self
    }

    /// Sets the `used_in` tag.
    pub fn used_in(mut self, used_in: impl Into<String>) -> Self {
        self.used_in = used_in.into();
        self
    }

    /// Role inferred from the key.
    pub fn role(&self) -> ValueRole {
        ValueRole::infer(&self.key)
    }
}

/// Numeric domain implied by an assumption's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueRole {
    /// Rate, share or ratio in `(0, 1]`.
    Ratio,
    /// Count, price or size, strictly positive.
    Quantity,
}

impl ValueRole {
    /// Infers the role from naming hints in `key`.
    pub fn infer(key: &str) -> Self {
        if RATIO_HINTS.iter().any(|hint| key.contains(hint)) {
            ValueRole::Ratio
        } else {
            ValueRole::Quantity
        }
    }

    /// Whether `value` lies in the domain of this role.
    pub fn admits(&self, value: f64) -> bool {
        match self {
            ValueRole::Ratio => value > 0.0 && value <= 1.0,
            ValueRole::Quantity => value.is_finite() && value > 0.0,
        }
    }
}

/// Insertion-ordered assumptions keyed by [`Assumption::key`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Assumption>", into = "Vec<Assumption>")]
pub struct AssumptionSet {
    entries: IndexMap<String, Assumption>,
}

impl AssumptionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assumption, rejecting duplicate keys.
    pub fn insert(&mut self, assumption: Assumption) -> Result<(), MszError> {
        if self.entries.contains_key(&assumption.key) {
            return Err(MszError::Validation(
                ErrorInfo::new(
                    "duplicate-key",
                    format!("assumption key '{}' appears more than once", assumption.key),
                )
                .with_context("key", assumption.key.clone()),
            ));
        }
        self.entries.insert(assumption.key.clone(), assumption);
        Ok(())
    }

    /// Builds a set from assumptions in order.
    pub fn from_assumptions(
        assumptions: impl IntoIterator<Item = Assumption>,
    ) -> Result<Self, MszError> {
        let mut set = Self::new();
        for assumption in assumptions {
            set.insert(assumption)?;
        }
        Ok(set)
    }

    /// Looks up an assumption by key.
    pub fn get(&self, key: &str) -> Option<&Assumption> {
        self.entries.get(key)
    }

    /// Numeric value for `key`, if present.
    pub fn value_of(&self, key: &str) -> Option<f64> {
        self.entries.get(key).map(|a| a.numeric_value)
    }

    /// Whether the set contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether every key in `keys` is present.
    pub fn contains_all(&self, keys: &[&str]) -> bool {
        keys.iter().all(|key| self.contains_key(key))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Assumptions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Assumption> + '_ {
        self.entries.values()
    }

    /// Number of assumptions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Non-blocking domain findings for every assumption.
    ///
    /// Ratios outside `(0, 1]`, non-positive quantities and non-finite values
    /// are reported; nothing is rejected.
    pub fn diagnostics(&self) -> Vec<ErrorInfo> {
        let mut findings = Vec::new();
        for assumption in self.entries.values() {
            let value = assumption.numeric_value;
            if !value.is_finite() {
                findings.push(
                    ErrorInfo::new(
                        "non-finite-value",
                        format!("{} is not a finite number", assumption.key),
                    )
                    .with_context("key", assumption.key.clone()),
                );
                continue;
            }
            let role = assumption.role();
            if role.admits(value) {
                continue;
            }
            let (code, expectation) = match role {
                ValueRole::Ratio => ("ratio-out-of-range", "in (0, 1]"),
                ValueRole::Quantity => ("non-positive-quantity", "positive"),
            };
            findings.push(
                ErrorInfo::new(
                    code,
                    format!("{} should be {expectation}, got {value}", assumption.key),
                )
                .with_context("key", assumption.key.clone())
                .with_context("value", value.to_string()),
            );
        }
        findings
    }
}

impl TryFrom<Vec<Assumption>> for AssumptionSet {
    type Error = MszError;

    fn try_from(assumptions: Vec<Assumption>) -> Result<Self, Self::Error> {
        Self::from_assumptions(assumptions)
    }
}

impl From<AssumptionSet> for Vec<Assumption> {
    fn from(set: AssumptionSet) -> Self {
        set.entries.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a AssumptionSet {
    type Item = &'a Assumption;
    type IntoIter = indexmap::map::Values<'a, String, Assumption>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
