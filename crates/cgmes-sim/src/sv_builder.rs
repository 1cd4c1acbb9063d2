//! State-variable (SV) profile builder.
//!
//! Projects a solved result into `SvVoltage` objects linked to their
//! topological nodes, preceded by the mandatory model header.

use cgmes_core::{ns, CgmesError, CgmesResult, CimObject, GraphName, ModelHeader, TripleStore};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::state::{SolvedState, TopologyMap};

/// Outcome of one SV build: what was written and what was dropped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SvBuildReport {
    /// Number of SvVoltage objects written.
    pub written: usize,
    /// Solver ids of nodes dropped for lack of a TopologicalNode mapping.
    pub missing_topology: Vec<i64>,
}

/// Writes the SV profile of a solved result into one target graph.
pub struct SvProfileBuilder<'a, S: TripleStore> {
    store: &'a mut S,
    target_graph: GraphName,
    header: ModelHeader,
}

impl<'a, S: TripleStore> SvProfileBuilder<'a, S> {
    pub fn new(store: &'a mut S, target_graph: GraphName) -> Self {
        Self {
            store,
            target_graph,
            header: ModelHeader::new(ns::SV_PROFILE),
        }
    }

    pub fn with_header(store: &'a mut S, target_graph: GraphName, header: ModelHeader) -> Self {
        Self {
            store,
            target_graph,
            header,
        }
    }

    /// Write the SV profile.
    ///
    /// With `overwrite_existing` the target graph is dropped first. Without
    /// a solved result this is a no-op (apart from the optional drop).
    /// Nodes missing from the topology map are excluded and reported in the
    /// returned [`SvBuildReport`], not treated as errors.
    pub fn build(
        &mut self,
        result: Option<&SolvedState>,
        topology: &TopologyMap,
        overwrite_existing: bool,
    ) -> CgmesResult<SvBuildReport> {
        if overwrite_existing {
            self.store.drop_graph(&self.target_graph)?;
        }

        let Some(result) = result else {
            return Ok(SvBuildReport::default());
        };

        self.store
            .insert_triples(&self.header.to_triples(), &self.target_graph)?;
        let report = self.write_sv_voltage(result, topology)?;
        self.write_power_flow()?;
        Ok(report)
    }

    fn write_sv_voltage(
        &mut self,
        result: &SolvedState,
        topology: &TopologyMap,
    ) -> CgmesResult<SvBuildReport> {
        let cim = cim_namespace(self.store)?;
        let mut objects = Vec::with_capacity(result.nodes.len());
        let mut missing_topology = Vec::new();

        for node in &result.nodes {
            let Some(toponode) = topology.get(&node.id) else {
                missing_topology.push(node.id);
                continue;
            };
            let mut obj = CimObject::new(Uuid::new_v4().to_string());
            obj.set_type(format!("{}SvVoltage", cim))?;
            obj.add_attribute(
                format!("{}SvVoltage.v", cim),
                (node.u / 1e3).to_string(),
            );
            obj.add_attribute(
                format!("{}SvVoltage.angle", cim),
                node.u_angle.to_degrees().to_string(),
            );
            obj.add_reference(format!("{}SvVoltage.TopologicalNode", cim), toponode);
            objects.push(obj);
        }

        if !missing_topology.is_empty() {
            warn!(nodes = ?missing_topology, "nodes without TopologicalNode mapping dropped");
        }

        self.store
            .insert_objects(&objects, &self.target_graph, true)?;
        Ok(SvBuildReport {
            written: objects.len(),
            missing_topology,
        })
    }

    /// `SvPowerFlow` emission hook; nothing is emitted yet.
    fn write_power_flow(&mut self) -> CgmesResult<()> {
        Ok(())
    }
}

/// The dataset's `cim:` namespace, required for every emitted predicate.
pub(crate) fn cim_namespace<S: TripleStore>(store: &S) -> CgmesResult<String> {
    store
        .prefixes()
        .cim_namespace()
        .map(str::to_string)
        .ok_or_else(|| CgmesError::Config("prefix table has no cim namespace".to_string()))
}
