use std::fmt;
use std::str::FromStr;

use msz_core::errors::{ErrorInfo, MszError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Sampling law for a ranged assumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Distribution {
    /// Flat over `[min, max]`.
    Uniform,
    /// Triangular with its peak at `most_likely`.
    #[default]
    Triangular,
    /// Normal around `most_likely` with `σ = (max − min) / 4`, clipped to the range.
    NormalClipped,
    /// Log-normal with log-mean `ln(most_likely)` and
    /// log-σ `(ln max − ln min) / 4`, clipped to the range.
    LogNormalClipped,
}

impl Distribution {
    /// Canonical tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Distribution::Uniform => "uniform",
            Distribution::Triangular => "triangular",
            Distribution::NormalClipped => "normal",
            Distribution::LogNormalClipped => "lognormal",
        }
    }

    /// Parses a tag. Unknown tags fail; no default is substituted.
    pub fn from_tag(tag: &str) -> Result<Self, MszError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(Distribution::Uniform),
            "triangular" => Ok(Distribution::Triangular),
            "normal" | "normal-clipped" => Ok(Distribution::NormalClipped),
            "lognormal" | "log-normal" | "lognormal-clipped" => Ok(Distribution::LogNormalClipped),
            other => Err(MszError::Distribution(
                ErrorInfo::new(
                    "unsupported-distribution",
                    format!("unknown distribution type '{other}'"),
                )
                .with_context("tag", other)
                .with_hint("use uniform, triangular, normal or lognormal"),
            )),
        }
    }

    /// Draws one value. Bounds must already be validated.
    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R, min: f64, mode: f64, max: f64) -> f64 {
        match self {
            Distribution::Uniform => min + (max - min) * rng.gen::<f64>(),
            Distribution::Triangular => triangular(rng.gen::<f64>(), min, mode, max),
            Distribution::NormalClipped => {
                let std = (max - min) / 4.0;
                (mode + std * standard_normal(rng)).clamp(min, max)
            }
            Distribution::LogNormalClipped => {
                let log_std = (max.ln() - min.ln()) / 4.0;
                (mode.ln() + log_std * standard_normal(rng))
                    .exp()
                    .clamp(min, max)
            }
        }
    }
}

/// Inverse CDF of the triangular distribution at `u ∈ [0, 1)`.
fn triangular(u: f64, min: f64, mode: f64, max: f64) -> f64 {
    let width = max - min;
    if width <= 0.0 {
        return min;
    }
    let peak = (mode - min) / width;
    let value = if u < peak {
        min + (u * width * (mode - min)).sqrt()
    } else {
        max - ((1.0 - u) * width * (max - mode)).sqrt()
    };
    value.clamp(min, max)
}

/// Box-Muller transform over two uniform draws.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // 1 - U keeps the radius argument in (0, 1].
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Distribution {
    type Err = MszError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Distribution::from_tag(raw)
    }
}

impl TryFrom<String> for Distribution {
    type Error = MszError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Distribution::from_tag(&raw)
    }
}

impl From<Distribution> for String {
    fn from(distribution: Distribution) -> Self {
        distribution.tag().to_string()
    }
}
