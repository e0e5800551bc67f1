//! Named scalar values handed to caller-supplied formulas.

use crate::errors::{ErrorInfo, MszError};

/// Read-only view of named inputs for one formula evaluation.
///
/// Names and values are parallel slices; lookups are linear, which is cheaper
/// than hashing for the handful of inputs a market estimate uses.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    names: &'a [String],
    values: &'a [f64],
}

impl<'a> Bindings<'a> {
    /// Pairs `names[i]` with `values[i]`; the slices must have equal length.
    pub fn new(names: &'a [String], values: &'a [f64]) -> Result<Self, MszError> {
        if names.len() != values.len() {
            return Err(MszError::Formula(
                ErrorInfo::new(
                    "binding-length-mismatch",
                    format!("{} names paired with {} values", names.len(), values.len()),
                )
                .with_context("names", names.len().to_string())
                .with_context("values", values.len().to_string()),
            ));
        }
        Ok(Self { names, values })
    }

    /// Value bound to `name`, or a formula error if it is absent.
    pub fn get(&self, name: &str) -> Result<f64, MszError> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|idx| self.values[idx])
            .ok_or_else(|| {
                MszError::Formula(
                    ErrorInfo::new("missing-input", format!("formula input '{name}' is not bound"))
                        .with_context("input", name)
                        .with_context("bound", self.names.join(",")),
                )
            })
    }

    /// Number of bound inputs.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no inputs are bound.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let names = self.names;
        let values = self.values;
        names
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
    }
}
