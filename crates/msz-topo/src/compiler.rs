use msz_core::errors::MszError;
use msz_core::{require_positive, AssumptionSet, ValueRole};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::{Expression, GraphBuilder, NodeKind, Operand, TopologyGraph};
use crate::pattern::{self, Blueprint, Pattern, Segment, Stage};

const AGGREGATE_ID: &str = "total";

/// Unit scaling applied to the population chain.
///
/// Some callers record `base_pop` in hundreds of millions of people and want
/// the final market size back in the same scale; see
/// [`CompilerOptions::hundred_million_units`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Multiplier applied to `base_pop` at the first stage.
    #[serde(default = "unit_scale")]
    pub population_multiplier: f64,
    /// Divisor applied at the final stage.
    #[serde(default = "unit_scale")]
    pub value_divisor: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            population_multiplier: unit_scale(),
            value_divisor: unit_scale(),
        }
    }
}

impl CompilerOptions {
    /// `base_pop` counted in 1e8 people, market size reported in 1e8 units.
    pub fn hundred_million_units() -> Self {
        Self {
            population_multiplier: 1e8,
            value_divisor: 1e8,
        }
    }
}

/// Infers the decomposition pattern of a named assumption set and emits its
/// ordered computation graph.
#[derive(Debug, Clone, Default)]
pub struct TopologyCompiler {
    options: CompilerOptions,
}

impl TopologyCompiler {
    /// Creates a compiler with the given unit options.
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Active options.
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Pattern that [`compile`](Self::compile) would use, if any.
    pub fn detect(&self, assumptions: &AssumptionSet) -> Option<Pattern> {
        Pattern::detect(assumptions)
    }

    /// Compiles `assumptions` into a graph.
    ///
    /// `Ok(None)` means no pattern matched; callers fall back to static
    /// values. Referenced assumptions must hold finite values.
    pub fn compile(&self, assumptions: &AssumptionSet) -> Result<Option<TopologyGraph>, MszError> {
        require_positive("population_multiplier", self.options.population_multiplier)?;
        require_positive("value_divisor", self.options.value_divisor)?;

        let Some(blueprint) = pattern::resolve(assumptions) else {
            warn!(
                assumptions = assumptions.len(),
                "no topology pattern matched; graph left unlinked"
            );
            return Ok(None);
        };
        let graph = match &blueprint {
            Blueprint::Segmented(segments) => build_segmented(assumptions, segments)?,
            Blueprint::Chain { pattern, stages } => {
                self.build_chain(assumptions, *pattern, stages)?
            }
        };
        debug!(
            pattern = %graph.pattern(),
            nodes = graph.nodes().len(),
            aggregate = graph.aggregate_value(),
            "compiled assumption topology"
        );
        Ok(Some(graph))
    }

    fn build_chain(
        &self,
        assumptions: &AssumptionSet,
        pattern: Pattern,
        stages: &[Stage],
    ) -> Result<TopologyGraph, MszError> {
        let scaled = pattern == Pattern::PopulationChain;
        let mut builder = GraphBuilder::new(assumptions);
        let mut previous: Option<&str> = None;
        for (idx, stage) in stages.iter().enumerate() {
            let last = idx + 1 == stages.len();
            let kind = if last {
                NodeKind::Aggregate
            } else if previous.is_none() {
                NodeKind::Input
            } else {
                NodeKind::Step
            };
            let (expression, unit) = match previous {
                None => {
                    let multiplier = scaled.then_some(self.options.population_multiplier);
                    first_stage(&builder, stage.key, multiplier)
                }
                Some(prev) => {
                    let divisor = if scaled && last {
                        self.options.value_divisor
                    } else {
                        1.0
                    };
                    let expression = Expression::Product {
                        factors: vec![
                            Operand::Node(prev.to_string()),
                            Operand::Assumption(stage.key.to_string()),
                        ],
                        divisor,
                    };
                    (expression, carried_unit(&builder, prev, stage.key))
                }
            };
            builder.push(stage.id, stage.label, expression, &unit, kind)?;
            previous = Some(stage.id);
        }
        let aggregate = previous.unwrap_or(AGGREGATE_ID);
        builder.finish(pattern, aggregate)
    }
}

fn first_stage(
    builder: &GraphBuilder<'_>,
    key: &str,
    multiplier: Option<f64>,
) -> (Expression, String) {
    let unit = builder
        .assumptions()
        .get(key)
        .map(|assumption| assumption.unit.clone())
        .unwrap_or_default();
    let expression = match multiplier {
        Some(factor) if factor != 1.0 => Expression::Product {
            factors: vec![
                Operand::Assumption(key.to_string()),
                Operand::Constant(factor),
            ],
            divisor: 1.0,
        },
        _ => Expression::Reference {
            key: key.to_string(),
        },
    };
    (expression, unit)
}

/// A ratio keeps the running unit; a quantity with its own unit replaces it.
fn carried_unit(builder: &GraphBuilder<'_>, previous: &str, key: &str) -> String {
    match builder.assumptions().get(key) {
        Some(assumption)
            if ValueRole::infer(key) == ValueRole::Quantity && !assumption.unit.is_empty() =>
        {
            assumption.unit.clone()
        }
        _ => builder.unit_of(previous),
    }
}

fn build_segmented(
    assumptions: &AssumptionSet,
    segments: &[Segment],
) -> Result<TopologyGraph, MszError> {
    let mut builder = GraphBuilder::new(assumptions);
    let mut terms = Vec::with_capacity(segments.len());
    for segment in segments {
        let count_id = format!("{}.count", segment.prefix);
        let adopted_id = format!("{}.adopted", segment.prefix);
        let value_id = format!("{}.value", segment.prefix);

        let (count_expression, count_unit) = first_stage(&builder, &segment.count_key, None);
        builder.push(
            &count_id,
            &format!("{}: institutions", segment.label),
            count_expression,
            &count_unit,
            NodeKind::Input,
        )?;

        let adopted_unit = carried_unit(&builder, &count_id, &segment.rate_key);
        builder.push(
            &adopted_id,
            &format!("{}: adopting institutions", segment.label),
            Expression::Product {
                factors: vec![
                    Operand::Node(count_id.clone()),
                    Operand::Assumption(segment.rate_key.clone()),
                ],
                divisor: 1.0,
            },
            &adopted_unit,
            NodeKind::Step,
        )?;

        let value_unit = carried_unit(&builder, &adopted_id, &segment.price_key);
        builder.push(
            &value_id,
            &format!("{}: market size", segment.label),
            Expression::Product {
                factors: vec![
                    Operand::Node(adopted_id.clone()),
                    Operand::Assumption(segment.price_key.clone()),
                ],
                divisor: 1.0,
            },
            &value_unit,
            NodeKind::Step,
        )?;
        terms.push(value_id);
    }

    let unit = terms
        .first()
        .map(|id| builder.unit_of(id))
        .unwrap_or_default();
    builder.push(
        AGGREGATE_ID,
        "Total addressable market",
        Expression::Sum { terms },
        &unit,
        NodeKind::Aggregate,
    )?;
    builder.finish(Pattern::InstitutionSegmented, AGGREGATE_ID)
}
