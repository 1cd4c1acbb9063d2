//! Solved network state consumed by the SV builder.
//!
//! The numeric solver is an external collaborator; this is the minimal
//! projection of its output the suite needs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Solved quantities for one electrical node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    /// Solver-internal node id.
    pub id: i64,
    /// Voltage magnitude in volts.
    pub u: f64,
    /// Voltage angle in radians.
    pub u_angle: f64,
}

/// A solved power-flow or state-estimation result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolvedState {
    pub nodes: Vec<NodeResult>,
}

impl SolvedState {
    pub fn new(nodes: Vec<NodeResult>) -> Self {
        Self { nodes }
    }
}

/// Side table linking solver node ids to their originating
/// TopologicalNode IRIs. Nodes absent from the table cannot be projected
/// back into CGMES and are dropped with a diagnostic.
pub type TopologyMap = HashMap<i64, String>;
