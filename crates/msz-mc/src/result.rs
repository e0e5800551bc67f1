use std::fmt;

use indexmap::IndexMap;
use msz_core::errors::{ErrorInfo, MszError};
use msz_core::{format_magnitude, to_flat_map};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stats::{self, Summary};

/// Distribution summary of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Arithmetic mean.
    pub mean: f64,
    /// 50th percentile.
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    /// 5th percentile.
    pub p5: f64,
    /// 10th percentile.
    pub p10: f64,
    /// 25th percentile.
    pub p25: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 90th percentile.
    pub p90: f64,
    /// 95th percentile.
    pub p95: f64,
    /// Smallest outcome.
    pub min: f64,
    /// Largest outcome.
    pub max: f64,
    /// Number of samples drawn.
    pub n_simulations: usize,
    /// Formula outputs in sample order.
    pub raw_samples: Vec<f64>,
    /// Signed percent impact per assumption.
    pub sensitivity: IndexMap<String, f64>,
    /// Unit of the outcome.
    pub unit: String,
    /// Non-fatal diagnostics raised during the run.
    #[serde(default)]
    pub warnings: Vec<ErrorInfo>,
}

impl MonteCarloResult {
    pub(crate) fn from_parts(
        raw_samples: Vec<f64>,
        sensitivity: IndexMap<String, f64>,
        unit: &str,
        warnings: Vec<ErrorInfo>,
    ) -> Self {
        let summary = Summary::from_samples(&raw_samples);
        Self {
            mean: summary.mean,
            median: summary.median,
            std: summary.std,
            p5: summary.p5,
            p10: summary.p10,
            p25: summary.p25,
            p75: summary.p75,
            p90: summary.p90,
            p95: summary.p95,
            min: summary.min,
            max: summary.max,
            n_simulations: raw_samples.len(),
            raw_samples,
            sensitivity,
            unit: unit.to_string(),
            warnings,
        }
    }

    /// Summary statistics without samples or sensitivity.
    pub fn summary(&self) -> Summary {
        Summary {
            mean: self.mean,
            median: self.median,
            std: self.std,
            p5: self.p5,
            p10: self.p10,
            p25: self.p25,
            p75: self.p75,
            p90: self.p90,
            p95: self.p95,
            min: self.min,
            max: self.max,
        }
    }

    /// Whether the reported percentiles are ordered.
    pub fn percentiles_ordered(&self) -> bool {
        self.summary().percentiles_ordered()
    }

    /// Arbitrary percentile of the raw samples, `p ∈ [0, 100]`.
    pub fn percentile(&self, p: f64) -> f64 {
        stats::percentile(&stats::sorted_copy(&self.raw_samples), p / 100.0)
    }

    /// Central interval holding `level` of the mass, e.g. `0.9` → `(p5, p95)`.
    pub fn confidence_interval(&self, level: f64) -> (f64, f64) {
        let sorted = stats::sorted_copy(&self.raw_samples);
        let tail = (1.0 - level.clamp(0.0, 1.0)) / 2.0;
        (
            stats::percentile(&sorted, tail),
            stats::percentile(&sorted, 1.0 - tail),
        )
    }

    /// Sensitivity entries ordered by absolute impact, largest first.
    pub fn tornado(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .sensitivity
            .iter()
            .map(|(name, impact)| (name.clone(), *impact))
            .collect();
        entries.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        entries
    }

    /// Flattens every numeric field and the signed sensitivity map; raw
    /// samples are left out. Keys keep field and input order.
    pub fn to_map(&self) -> Result<Map<String, Value>, MszError> {
        let mut map = to_flat_map(self)?;
        map.remove("raw_samples");
        Ok(map)
    }
}

const TORNADO_WIDTH: f64 = 20.0;

impl fmt::Display for MonteCarloResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = &self.unit;
        let band = |low: f64, high: f64| {
            format!("[{}, {}] {unit}", format_magnitude(low), format_magnitude(high))
        };
        writeln!(f, "== Monte Carlo simulation ==")?;
        writeln!(f, "simulations: {}", self.n_simulations)?;
        writeln!(f)?;
        writeln!(f, "summary:")?;
        writeln!(f, "  mean:   {} {unit}", format_magnitude(self.mean))?;
        writeln!(f, "  median: {} {unit}", format_magnitude(self.median))?;
        writeln!(f, "  std:    {} {unit}", format_magnitude(self.std))?;
        writeln!(f)?;
        writeln!(f, "confidence intervals:")?;
        writeln!(f, "  90% CI: {}", band(self.p5, self.p95))?;
        writeln!(f, "  80% CI: {}", band(self.p10, self.p90))?;
        writeln!(f, "  50% CI: {}", band(self.p25, self.p75))?;
        writeln!(f)?;
        write!(f, "  range:  {}", band(self.min, self.max))?;

        let tornado = self.tornado();
        if !tornado.is_empty() {
            let widest = tornado[0].1.abs();
            write!(f, "\n\nsensitivity (tornado):")?;
            for (name, impact) in &tornado {
                let width = if widest > 0.0 {
                    impact.abs() / widest * TORNADO_WIDTH
                } else {
                    0.0
                };
                let bar = "█".repeat(width as usize);
                write!(f, "\n  {name}: {bar} ({impact:+.1}%)")?;
            }
        }
        Ok(())
    }
}
