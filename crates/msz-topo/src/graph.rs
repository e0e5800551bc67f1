use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use msz_core::errors::{ErrorInfo, MszError};
use msz_core::AssumptionSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::pattern::Pattern;

/// Single factor of a product expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ref", rename_all = "kebab-case")]
pub enum Operand {
    /// Value of an earlier node.
    Node(String),
    /// Live value of an assumption.
    Assumption(String),
    /// Fixed scale factor.
    Constant(f64),
}

/// Symbolic definition of a node's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Expression {
    /// Raw assumption value.
    Reference {
        /// Assumption key.
        key: String,
    },
    /// `factors[0] × factors[1] × … / divisor`.
    Product {
        /// Multiplied operands, in order.
        factors: Vec<Operand>,
        /// Final divisor; `1` means none.
        #[serde(default = "unit_divisor")]
        divisor: f64,
    },
    /// Sum of earlier nodes.
    Sum {
        /// Node ids being added.
        terms: Vec<String>,
    },
}

fn unit_divisor() -> f64 {
    1.0
}

impl Expression {
    /// Ids of the nodes this expression reads.
    pub fn node_refs(&self) -> Vec<&str> {
        match self {
            Expression::Reference { .. } => Vec::new(),
            Expression::Product { factors, .. } => factors
                .iter()
                .filter_map(|operand| match operand {
                    Operand::Node(id) => Some(id.as_str()),
                    _ => None,
                })
                .collect(),
            Expression::Sum { terms } => terms.iter().map(String::as_str).collect(),
        }
    }

    /// Assumption keys this expression reads.
    pub fn assumption_refs(&self) -> Vec<&str> {
        match self {
            Expression::Reference { key } => vec![key.as_str()],
            Expression::Product { factors, .. } => factors
                .iter()
                .filter_map(|operand| match operand {
                    Operand::Assumption(key) => Some(key.as_str()),
                    _ => None,
                })
                .collect(),
            Expression::Sum { .. } => Vec::new(),
        }
    }

    fn evaluate(
        &self,
        assumptions: &AssumptionSet,
        prior: &IndexMap<String, f64>,
    ) -> Result<f64, MszError> {
        match self {
            Expression::Reference { key } => assumption_value(assumptions, key),
            Expression::Product { factors, divisor } => {
                let mut value = 1.0;
                for operand in factors {
                    value *= match operand {
                        Operand::Node(id) => node_value(prior, id)?,
                        Operand::Assumption(key) => assumption_value(assumptions, key)?,
                        Operand::Constant(constant) => *constant,
                    };
                }
                Ok(value / divisor)
            }
            Expression::Sum { terms } => terms
                .iter()
                .map(|id| node_value(prior, id))
                .sum::<Result<f64, MszError>>(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Node(id) => f.write_str(id),
            Operand::Assumption(key) => write!(f, "[{key}]"),
            Operand::Constant(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Reference { key } => write!(f, "[{key}]"),
            Expression::Product { factors, divisor } => {
                for (idx, operand) in factors.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" * ")?;
                    }
                    write!(f, "{operand}")?;
                }
                if *divisor != 1.0 {
                    write!(f, " / {divisor}")?;
                }
                Ok(())
            }
            Expression::Sum { terms } => f.write_str(&terms.join(" + ")),
        }
    }
}

fn assumption_value(assumptions: &AssumptionSet, key: &str) -> Result<f64, MszError> {
    let value = assumptions.value_of(key).ok_or_else(|| {
        MszError::Validation(
            ErrorInfo::new(
                "missing-assumption",
                format!("assumption '{key}' is referenced but not supplied"),
            )
            .with_context("key", key),
        )
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MszError::invalid_parameter(key, value, "be finite"))
    }
}

fn node_value(prior: &IndexMap<String, f64>, id: &str) -> Result<f64, MszError> {
    prior.get(id).copied().ok_or_else(|| {
        MszError::Topology(
            ErrorInfo::new(
                "forward-reference",
                format!("node '{id}' is read before it is defined"),
            )
            .with_context("node", id),
        )
    })
}

/// Role of a node within the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Direct reference to an assumption.
    Input,
    /// Intermediate product.
    Step,
    /// Final value of the graph.
    Aggregate,
}

/// One entry of the ordered computation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationNode {
    /// Symbolic reference used by later nodes.
    pub id: String,
    /// Display label.
    pub label: String,
    /// How the value is computed.
    pub expression: Expression,
    /// Unit of the value.
    pub unit: String,
    /// Value at compile time.
    pub numeric_value: f64,
    /// Role within the graph.
    pub kind: NodeKind,
}

/// Dependency-ordered computation graph for one assumption snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyGraph {
    pattern: Pattern,
    nodes: Vec<ComputationNode>,
    aggregate: String,
}

impl TopologyGraph {
    /// Pattern the graph was compiled from.
    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Nodes in evaluation order.
    pub fn nodes(&self) -> &[ComputationNode] {
        &self.nodes
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&ComputationNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// The aggregate node.
    pub fn aggregate(&self) -> Option<&ComputationNode> {
        self.node(&self.aggregate)
    }

    /// Value of the aggregate node; NaN if it is missing.
    pub fn aggregate_value(&self) -> f64 {
        self.aggregate().map_or(f64::NAN, |node| node.numeric_value)
    }

    /// Nodes summed by the aggregate; empty for chain patterns.
    pub fn segments(&self) -> Vec<&ComputationNode> {
        match self.aggregate().map(|node| &node.expression) {
            Some(Expression::Sum { terms }) => {
                terms.iter().filter_map(|id| self.node(id)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Assumption keys the graph reads, in first-use order.
    pub fn linked_keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .flat_map(|node| node.expression.assumption_refs())
            .filter(|key| seen.insert(*key))
            .collect()
    }

    /// Checks that every node reads only nodes defined before it.
    pub fn verify_order(&self) -> Result<(), MszError> {
        let mut defined: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        for (position, node) in self.nodes.iter().enumerate() {
            for dependency in node.expression.node_refs() {
                if dependency == node.id {
                    return Err(order_error("self-reference", node, dependency, position));
                }
                if !defined.contains(dependency) {
                    return Err(order_error("forward-reference", node, dependency, position));
                }
            }
            if !defined.insert(node.id.as_str()) {
                return Err(MszError::Topology(
                    ErrorInfo::new("duplicate-node", format!("node '{}' is defined twice", node.id))
                        .with_context("node", node.id.clone()),
                ));
            }
        }
        if !defined.contains(self.aggregate.as_str()) {
            return Err(MszError::Topology(
                ErrorInfo::new(
                    "missing-aggregate",
                    format!("aggregate node '{}' is not in the graph", self.aggregate),
                )
                .with_context("node", self.aggregate.clone()),
            ));
        }
        Ok(())
    }

    /// Re-evaluates the same structure against a new assumption snapshot.
    ///
    /// Returns a new graph; `self` is left untouched.
    pub fn rebind(&self, assumptions: &AssumptionSet) -> Result<TopologyGraph, MszError> {
        let mut builder = GraphBuilder::new(assumptions);
        for node in &self.nodes {
            builder.push(
                &node.id,
                &node.label,
                node.expression.clone(),
                &node.unit,
                node.kind,
            )?;
        }
        builder.finish(self.pattern, &self.aggregate)
    }

    /// SHA-256 over the pattern and node structure; values are excluded.
    pub fn canonical_hash(&self) -> String {
        let mut hasher = Sha256::new();
        update_str(self.pattern.tag(), &mut hasher);
        hasher.update((self.nodes.len() as u64).to_le_bytes());
        for node in &self.nodes {
            update_str(&node.id, &mut hasher);
            update_str(kind_tag(node.kind), &mut hasher);
            update_str(&node.expression.to_string(), &mut hasher);
        }
        update_str(&self.aggregate, &mut hasher);
        format!("{:x}", hasher.finalize())
    }
}

fn order_error(code: &str, node: &ComputationNode, dependency: &str, position: usize) -> MszError {
    MszError::Topology(
        ErrorInfo::new(
            code,
            format!("node '{}' reads '{dependency}' which is not defined before it", node.id),
        )
        .with_context("node", node.id.clone())
        .with_context("dependency", dependency)
        .with_context("position", position.to_string()),
    )
}

fn kind_tag(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Input => "input",
        NodeKind::Step => "step",
        NodeKind::Aggregate => "aggregate",
    }
}

fn update_str(value: &str, hasher: &mut Sha256) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Appends nodes in order, evaluating each against the snapshot as it goes.
pub(crate) struct GraphBuilder<'a> {
    assumptions: &'a AssumptionSet,
    nodes: Vec<ComputationNode>,
    values: IndexMap<String, f64>,
}

impl<'a> GraphBuilder<'a> {
    pub(crate) fn new(assumptions: &'a AssumptionSet) -> Self {
        Self {
            assumptions,
            nodes: Vec::new(),
            values: IndexMap::new(),
        }
    }

    pub(crate) fn assumptions(&self) -> &'a AssumptionSet {
        self.assumptions
    }

    pub(crate) fn unit_of(&self, id: &str) -> String {
        self.nodes
            .iter()
            .find(|node| node.id == id)
            .map(|node| node.unit.clone())
            .unwrap_or_default()
    }

    pub(crate) fn push(
        &mut self,
        id: &str,
        label: &str,
        expression: Expression,
        unit: &str,
        kind: NodeKind,
    ) -> Result<f64, MszError> {
        let numeric_value = expression
            .evaluate(self.assumptions, &self.values)
            .map_err(|err| err.with_context("node", id))?;
        self.values.insert(id.to_string(), numeric_value);
        self.nodes.push(ComputationNode {
            id: id.to_string(),
            label: label.to_string(),
            expression,
            unit: unit.to_string(),
            numeric_value,
            kind,
        });
        Ok(numeric_value)
    }

    pub(crate) fn finish(self, pattern: Pattern, aggregate: &str) -> Result<TopologyGraph, MszError> {
        let graph = TopologyGraph {
            pattern,
            nodes: self.nodes,
            aggregate: aggregate.to_string(),
        };
        graph.verify_order()?;
        Ok(graph)
    }
}
