//! Progressive-reveal script.
//!
//! Each step lists the nodes and edges that should be visible by that point.
//! Edges use the diagram's arrow notation (`P-->A`, `MCP-.->A`); a dotted
//! arrow marks an optional integration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wfgen_common::error::{WfgenError, WfgenResult};

const DOTTED_ARROW: &str = "-.->";

/// One accumulation step of the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealStep {
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<String>,
}

impl RevealStep {
    pub fn new<N, E>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            edges: edges.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered, non-empty list of reveal steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RevealStep>", into = "Vec<RevealStep>")]
pub struct RevealScript {
    steps: Vec<RevealStep>,
}

impl RevealScript {
    pub fn new(steps: Vec<RevealStep>) -> WfgenResult<Self> {
        if steps.is_empty() {
            return Err(WfgenError::invalid_input(
                "reveal script must contain at least one step",
            ));
        }
        Ok(Self { steps })
    }

    /// The stock workflow reveal: prompt, agent, optional integrations,
    /// planning, implementation, then a hold on the complete diagram.
    pub fn default_workflow() -> Self {
        let full_nodes = ["P", "A", "MCP", "D", "B", "I"];
        let full_edges = ["P-->A", "MCP-.->A", "D-.->A", "A-->B", "B-->I"];
        Self {
            steps: vec![
                RevealStep::new(["P"], Vec::<String>::new()),
                RevealStep::new(["P", "A"], ["P-->A"]),
                RevealStep::new(["P", "A", "MCP", "D"], ["P-->A", "MCP-.->A", "D-.->A"]),
                RevealStep::new(
                    ["P", "A", "MCP", "D", "B"],
                    ["P-->A", "MCP-.->A", "D-.->A", "A-->B"],
                ),
                RevealStep::new(full_nodes, full_edges),
                RevealStep::new(full_nodes, full_edges),
            ],
        }
    }

    /// Load a script from a JSON array of `{ "nodes": [...], "edges": [...] }`.
    pub fn from_json_file(path: impl AsRef<Path>) -> WfgenResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WfgenError::invalid_input(format!(
                "failed to read reveal script {}: {e}",
                path.display()
            ))
        })?;
        let steps: Vec<RevealStep> = serde_json::from_str(&content)?;
        Self::new(steps)
    }

    pub fn steps(&self) -> &[RevealStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every node in order of first appearance.
    pub fn distinct_nodes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for node in self.steps.iter().flat_map(|s| s.nodes.iter()) {
            if !seen.contains(&node.as_str()) {
                seen.push(node.as_str());
            }
        }
        seen
    }

    /// `(from, to)` pairs of every dotted edge, deduplicated.
    pub fn optional_edges(&self) -> Vec<(&str, &str)> {
        let mut edges = Vec::new();
        for edge in self.steps.iter().flat_map(|s| s.edges.iter()) {
            if let Some(pair) = split_edge(edge, DOTTED_ARROW) {
                if !edges.contains(&pair) {
                    edges.push(pair);
                }
            }
        }
        edges
    }
}

impl TryFrom<Vec<RevealStep>> for RevealScript {
    type Error = WfgenError;

    fn try_from(steps: Vec<RevealStep>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<RevealScript> for Vec<RevealStep> {
    fn from(script: RevealScript) -> Self {
        script.steps
    }
}

fn split_edge<'a>(edge: &'a str, arrow: &str) -> Option<(&'a str, &'a str)> {
    let (from, to) = edge.split_once(arrow)?;
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() {
        return None;
    }
    Some((from, to))
}
