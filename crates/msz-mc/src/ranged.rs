use msz_core::errors::MszError;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;

/// Uncertain input described by a range and a sampling law.
///
/// Fields are public for ergonomic construction; the engine re-validates
/// every assumption before drawing any sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRangedAssumption")]
pub struct RangedAssumption {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Mode or centre; the midpoint unless given.
    pub most_likely: f64,
    /// Sampling law.
    pub distribution: Distribution,
    /// Unit of the values.
    #[serde(default)]
    pub unit: String,
    /// Where the range came from.
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRangedAssumption {
    min: f64,
    max: f64,
    #[serde(default)]
    most_likely: Option<f64>,
    #[serde(default)]
    distribution: Option<String>,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    source: String,
}

impl RawRangedAssumption {
    pub(crate) fn into_assumption(self) -> Result<RangedAssumption, MszError> {
        let distribution = match self.distribution.as_deref() {
            Some(tag) => Distribution::from_tag(tag)?,
            None => Distribution::default(),
        };
        let mut assumption =
            RangedAssumption::new(self.min, self.max, self.most_likely, distribution)?;
        assumption.unit = self.unit;
        assumption.source = self.source;
        Ok(assumption)
    }
}

impl TryFrom<RawRangedAssumption> for RangedAssumption {
    type Error = MszError;

    fn try_from(raw: RawRangedAssumption) -> Result<Self, Self::Error> {
        raw.into_assumption()
    }
}

impl RangedAssumption {
    /// Creates a validated assumption; `most_likely` defaults to the midpoint.
    pub fn new(
        min: f64,
        max: f64,
        most_likely: Option<f64>,
        distribution: Distribution,
    ) -> Result<Self, MszError> {
        let assumption = Self {
            min,
            max,
            most_likely: most_likely.unwrap_or((min + max) / 2.0),
            distribution,
            unit: String::new(),
            source: String::new(),
        };
        assumption.validate()?;
        Ok(assumption)
    }

    /// Triangular assumption peaking at `mode`.
    pub fn triangular(min: f64, mode: f64, max: f64) -> Result<Self, MszError> {
        Self::new(min, max, Some(mode), Distribution::Triangular)
    }

    /// Uniform assumption over `[min, max]`.
    pub fn uniform(min: f64, max: f64) -> Result<Self, MszError> {
        Self::new(min, max, None, Distribution::Uniform)
    }

    /// Clipped normal centred on `mode`.
    pub fn normal(min: f64, mode: f64, max: f64) -> Result<Self, MszError> {
        Self::new(min, max, Some(mode), Distribution::NormalClipped)
    }

    /// Clipped log-normal centred on `mode`.
    pub fn lognormal(min: f64, mode: f64, max: f64) -> Result<Self, MszError> {
        Self::new(min, max, Some(mode), Distribution::LogNormalClipped)
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Checks `min ≤ most_likely ≤ max`, finiteness, and a positive range
    /// for log-normal sampling.
    pub fn validate(&self) -> Result<(), MszError> {
        for (parameter, value) in [
            ("min", self.min),
            ("max", self.max),
            ("most_likely", self.most_likely),
        ] {
            if !value.is_finite() {
                return Err(MszError::invalid_parameter(parameter, value, "be finite"));
            }
        }
        if self.min > self.max {
            return Err(MszError::invalid_parameter(
                "min",
                self.min,
                &format!("not exceed max ({})", self.max),
            ));
        }
        if self.most_likely < self.min || self.most_likely > self.max {
            return Err(MszError::invalid_parameter(
                "most_likely",
                self.most_likely,
                &format!("lie in [{}, {}]", self.min, self.max),
            ));
        }
        if self.distribution == Distribution::LogNormalClipped && self.min <= 0.0 {
            return Err(MszError::invalid_parameter(
                "min",
                self.min,
                "be positive for lognormal sampling",
            ));
        }
        Ok(())
    }
}
