use serde::{Deserialize, Serialize};

/// Summary statistics over a finished sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
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
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
}

impl Summary {
    /// Summarises `samples`; NaN everywhere for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: f64::NAN,
                median: f64::NAN,
                std: f64::NAN,
                p5: f64::NAN,
                p10: f64::NAN,
                p25: f64::NAN,
                p75: f64::NAN,
                p90: f64::NAN,
                p95: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            };
        }
        let sorted = sorted_copy(samples);
        let len = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / len;
        let variance = sorted.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / len;
        Self {
            mean,
            median: percentile(&sorted, 0.5),
            std: variance.sqrt(),
            p5: percentile(&sorted, 0.05),
            p10: percentile(&sorted, 0.10),
            p25: percentile(&sorted, 0.25),
            p75: percentile(&sorted, 0.75),
            p90: percentile(&sorted, 0.90),
            p95: percentile(&sorted, 0.95),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }

    /// Whether `p5 ≤ p10 ≤ p25 ≤ median ≤ p75 ≤ p90 ≤ p95`.
    pub fn percentiles_ordered(&self) -> bool {
        let chain = [
            self.p5,
            self.p10,
            self.p25,
            self.median,
            self.p75,
            self.p90,
            self.p95,
        ];
        chain.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

pub(crate) fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolation percentile of an ascending slice, `quantile ∈ [0, 1]`.
///
/// Interpolating as `lo + (hi - lo) * w` and clamping to `[lo, hi]` keeps the
/// result monotone in `quantile`, including across runs of equal values.
pub(crate) fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = quantile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        let (lo, hi) = (sorted[lower], sorted[upper]);
        (lo + (hi - lo) * weight).clamp(lo, hi)
    }
}
