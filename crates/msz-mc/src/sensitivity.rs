use indexmap::IndexMap;
use msz_core::errors::ErrorInfo;
use msz_core::{Bindings, MszError};

use crate::ranged::RangedAssumption;

/// Result of a one-factor-at-a-time sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum SensitivityOutcome {
    /// Signed percent change per assumption, in input order.
    Ranked {
        /// Finite impacts only.
        impacts: IndexMap<String, f64>,
        /// One `non-finite-sensitivity` entry per assumption left out
        /// because the formula blew up at one of its bounds.
        skipped: Vec<ErrorInfo>,
    },
    /// The all-`most_likely` baseline is zero or non-finite, so percent
    /// changes are undefined.
    UndefinedBaseline(f64),
}

/// Moves each assumption alone to `max` and to `min`, holding the rest at
/// `most_likely`, and keeps the percent change with the larger magnitude.
///
/// Equal magnitudes resolve to the high side. An assumption whose bound
/// evaluation is not finite is left out of the ranking and reported in
/// `skipped`.
pub fn one_at_a_time<F>(
    names: &[String],
    assumptions: &[&RangedAssumption],
    formula: &F,
) -> Result<SensitivityOutcome, MszError>
where
    F: Fn(&Bindings<'_>) -> Result<f64, MszError>,
{
    let mut values: Vec<f64> = assumptions.iter().map(|a| a.most_likely).collect();
    let baseline = formula(&Bindings::new(names, &values)?)?;
    if baseline == 0.0 || !baseline.is_finite() {
        return Ok(SensitivityOutcome::UndefinedBaseline(baseline));
    }

    let mut impacts = IndexMap::with_capacity(names.len());
    let mut skipped = Vec::new();
    for (idx, assumption) in assumptions.iter().enumerate() {
        values[idx] = assumption.max;
        let high = formula(&Bindings::new(names, &values)?)?;
        values[idx] = assumption.min;
        let low = formula(&Bindings::new(names, &values)?)?;
        values[idx] = assumption.most_likely;

        let blown = [("max", assumption.max, high), ("min", assumption.min, low)]
            .into_iter()
            .find(|(_, _, output)| !output.is_finite());
        if let Some((bound, input, output)) = blown {
            skipped.push(
                ErrorInfo::new(
                    "non-finite-sensitivity",
                    format!("formula produced {output} with '{}' at its {bound}", names[idx]),
                )
                .with_context("assumption", names[idx].clone())
                .with_context("bound", bound)
                .with_context("input", input.to_string()),
            );
            continue;
        }

        let high_change = (high - baseline) / baseline * 100.0;
        let low_change = (low - baseline) / baseline * 100.0;
        let impact = if high_change.abs() >= low_change.abs() {
            high_change
        } else {
            low_change
        };
        impacts.insert(names[idx].clone(), impact);
    }
    Ok(SensitivityOutcome::Ranked { impacts, skipped })
}
