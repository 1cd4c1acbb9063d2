//! Synthetic power-measurement generation.
//!
//! Turns the `SvPowerFlow` results already present in a dataset into
//! `Analog` / `AnalogValue` pairs: one active- and one reactive-power
//! measurement per terminal, with limits taken from the voltage-bracketed
//! range table and values distorted by seeded gaussian noise. Measurement
//! definitions and value metadata land in the operational (OP) graph; the
//! sampled values land in the measurement (MEAS) graph without a persisted
//! identifier, keyed by the shared mRID alone.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use cgmes_core::{CgmesError, CgmesResult, CimObject, GraphName, TableRow, TripleStore};

use crate::ranges::{MeasurementRange, MeasurementRangeSet};
use crate::sv_builder::cim_namespace;

/// Timestamp stamped onto every synthesized value.
pub const MEAS_TIMESTAMP: &str = "2021-01-01T00:00:00Z";

/// Provenance of a measurement value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MeasurementSource {
    Scada,
    Iccp,
}

/// One terminal's solved power flow plus the equipment context needed to
/// attach measurements to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SvPowerRow {
    /// IRI of the `SvPowerFlow` object.
    pub sv: String,
    /// IRI of the measured terminal.
    pub terminal: String,
    /// IRI of the conducting equipment behind the terminal.
    pub equipment: String,
    /// Equipment name, used to derive measurement names.
    pub name: String,
    /// IRI of the terminal's topological node.
    pub topological_node: String,
    /// Active power in MW.
    pub p: f64,
    /// Reactive power in MVAr.
    pub q: f64,
    /// Nominal voltage in kV, when the node has a base voltage.
    pub nominal_voltage: Option<f64>,
    pub max_p: Option<f64>,
    pub min_p: Option<f64>,
    pub rated_s: Option<f64>,
    /// Current limit in A, lowest-priority rating fallback.
    pub current_limit: Option<f64>,
}

impl SvPowerRow {
    /// Apparent-power rating of the equipment in MVA, from the best
    /// available source: operating bounds, then transformer ratedS, then
    /// the current limit converted via the nominal voltage.
    pub fn rating_mva(&self) -> Option<f64> {
        if let Some(max_p) = self.max_p {
            return Some(max_p.abs().max(self.min_p.map_or(0.0, f64::abs)));
        }
        if let Some(rated_s) = self.rated_s {
            return Some(rated_s);
        }
        match (self.current_limit, self.nominal_voltage) {
            (Some(max_i), Some(nom_v)) => Some(max_i * nom_v / 1000.0),
            _ => None,
        }
    }
}

/// Terminal-grouped power flows with equipment context and optional ratings.
const SV_POWER_QUERY: &str = "\
SELECT
    (SAMPLE(?_sv) as ?sv)
    ?term
    (SAMPLE(?_eq) as ?eq)
    (SAMPLE(?_name) as ?name)
    (SAMPLE(?_tn) as ?tn)
    (SAMPLE(?_p) as ?p)
    (SAMPLE(?_q) as ?q)
    (SAMPLE(?_nomV) as ?nomV)
    (SAMPLE(?_maxP) as ?maxP)
    (SAMPLE(?_minP) as ?minP)
    (SAMPLE(?_ratedS) as ?ratedS)
    (SAMPLE(?_maxI) as ?maxI)
WHERE {
    ?_sv cim:SvPowerFlow.p ?_p;
         cim:SvPowerFlow.q ?_q;
         cim:SvPowerFlow.Terminal ?term.

    ?term cim:Terminal.ConductingEquipment ?_eq;
          cim:Terminal.TopologicalNode ?_tn;
          cim:IdentifiedObject.name ?_name.

    OPTIONAL {
        ?_tn cim:TopologicalNode.BaseVoltage/cim:BaseVoltage.nominalVoltage ?_nomV.
    }
    OPTIONAL {
        ?_eq cim:RotatingMachine.GeneratingUnit ?_genUnit.
        ?_genUnit cim:GeneratingUnit.maxOperatingP ?_maxP;
                  cim:GeneratingUnit.minOperatingP ?_minP.
    }
    OPTIONAL {
        ?_eq cim:ExternalNetworkInjection.maxP ?_maxP;
             cim:ExternalNetworkInjection.minP ?_minP.
    }
    OPTIONAL {
        ?_trEnd cim:TransformerEnd.Terminal ?term;
                cim:PowerTransformerEnd.ratedS ?_ratedS.
    }
    OPTIONAL {
        ?_limitSet cim:OperationalLimitSet.Terminal ?term.
        ?_currentLimit cim:OperationalLimit.OperationalLimitSet ?_limitSet;
                       cim:CurrentLimit.value ?_maxI.
    }
}
GROUP BY ?term
ORDER BY ?term";

/// Fetches terminal-grouped power flows from the store.
pub fn fetch_sv_power_rows<S: TripleStore>(store: &mut S) -> CgmesResult<Vec<SvPowerRow>> {
    let table = store.query(SV_POWER_QUERY)?;
    let mut rows = Vec::with_capacity(table.len());
    for row in table.rows() {
        rows.push(SvPowerRow {
            sv: required(&row, "sv")?.to_string(),
            terminal: required(&row, "term")?.to_string(),
            equipment: required(&row, "eq")?.to_string(),
            name: required(&row, "name")?.to_string(),
            topological_node: required(&row, "tn")?.to_string(),
            p: required_f64(&row, "p")?,
            q: required_f64(&row, "q")?,
            nominal_voltage: row.get_f64("nomV"),
            max_p: row.get_f64("maxP"),
            min_p: row.get_f64("minP"),
            rated_s: row.get_f64("ratedS"),
            current_limit: row.get_f64("maxI"),
        });
    }
    Ok(rows)
}

fn required<'a>(row: &TableRow<'a>, column: &str) -> CgmesResult<&'a str> {
    row.get(column)
        .ok_or_else(|| CgmesError::Store(format!("power query row lacks binding for ?{column}")))
}

fn required_f64(row: &TableRow<'_>, column: &str) -> CgmesResult<f64> {
    required(row, column)?
        .parse()
        .map_err(|_| CgmesError::Store(format!("non-numeric binding for ?{column}")))
}

/// Counts of what one synthesis run wrote.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MeasurementBuildReport {
    /// `Analog` objects written to the OP graph.
    pub analogs: usize,
    /// `AnalogValue` objects written (each present in OP and MEAS).
    pub analog_values: usize,
}

/// Measurement kind handled by one pass of the builder.
#[derive(Debug, Clone, Copy)]
enum PowerKind {
    Active,
    Reactive,
}

impl PowerKind {
    fn measurement_type(self) -> &'static str {
        match self {
            PowerKind::Active => "ThreePhaseActivePower",
            PowerKind::Reactive => "ThreePhaseReactivePower",
        }
    }

    fn unit_symbol(self) -> &'static str {
        match self {
            PowerKind::Active => "UnitSymbol.W",
            PowerKind::Reactive => "UnitSymbol.VAr",
        }
    }

    fn letter(self) -> &'static str {
        match self {
            PowerKind::Active => "P",
            PowerKind::Reactive => "Q",
        }
    }

    fn true_value(self, row: &SvPowerRow) -> f64 {
        match self {
            PowerKind::Active => row.p,
            PowerKind::Reactive => row.q,
        }
    }
}

/// Synthesizes `Analog`/`AnalogValue` pairs from solved power flows.
pub struct PowerMeasurementBuilder<'a, S: TripleStore> {
    store: &'a mut S,
    ranges: &'a MeasurementRangeSet,
    sources: HashMap<MeasurementSource, String>,
    op_graph: GraphName,
    meas_graph: GraphName,
    seed: Option<u64>,
}

impl<'a, S: TripleStore> PowerMeasurementBuilder<'a, S> {
    pub fn new(
        store: &'a mut S,
        ranges: &'a MeasurementRangeSet,
        sources: HashMap<MeasurementSource, String>,
        op_graph: GraphName,
        meas_graph: GraphName,
    ) -> Self {
        Self {
            store,
            ranges,
            sources,
            op_graph,
            meas_graph,
            seed: Some(42),
        }
    }

    /// `None` draws the noise seed from entropy instead of the default.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Fetches power flows from the store and synthesizes measurements.
    pub fn build_from_sv(&mut self) -> CgmesResult<MeasurementBuildReport> {
        let rows = fetch_sv_power_rows(self.store)?;
        self.build_from_rows(&rows)
    }

    /// Synthesizes measurements for already-fetched rows.
    pub fn build_from_rows(&mut self, rows: &[SvPowerRow]) -> CgmesResult<MeasurementBuildReport> {
        let cim = cim_namespace(self.store)?;
        let scada = self
            .sources
            .get(&MeasurementSource::Scada)
            .cloned()
            .ok_or_else(|| {
                CgmesError::Config("measurement source map has no SCADA entry".to_string())
            })?;

        // All range lookups up front so a bad row fails before anything is
        // written.
        let ranges = rows
            .iter()
            .map(|row| self.range_for(row).copied())
            .collect::<CgmesResult<Vec<_>>>()?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut report = MeasurementBuildReport::default();
        for kind in [PowerKind::Active, PowerKind::Reactive] {
            let analogs = self.write_analogs(rows, &ranges, &cim, kind)?;
            report.analogs += analogs.len();
            report.analog_values +=
                self.write_values(rows, &ranges, &analogs, &cim, &scada, kind, &mut rng)?;
        }

        debug!(
            analogs = report.analogs,
            values = report.analog_values,
            "synthesized power measurements"
        );
        Ok(report)
    }

    fn range_for(&self, row: &SvPowerRow) -> CgmesResult<&MeasurementRange> {
        row.nominal_voltage
            .and_then(|nom_v| self.ranges.by_voltage(nom_v))
            .ok_or_else(|| CgmesError::RangeLookup {
                terminal: row.terminal.clone(),
            })
    }

    /// Writes one `Analog` per row into the OP graph and returns the
    /// `SvPowerFlow → Analog mRID` map for the value pass.
    fn write_analogs(
        &mut self,
        rows: &[SvPowerRow],
        ranges: &[MeasurementRange],
        cim: &str,
        kind: PowerKind,
    ) -> CgmesResult<HashMap<String, String>> {
        let mut sv_to_analog = HashMap::with_capacity(rows.len());
        let mut objects = Vec::with_capacity(rows.len());

        for (row, range) in rows.iter().zip(ranges) {
            let mrid = Uuid::new_v4().to_string();
            let mut obj = CimObject::new(mrid.clone());
            obj.set_type(format!("{cim}Analog"))?;
            obj.add_reference(format!("{cim}Measurement.Terminal"), &row.terminal);
            obj.add_reference(
                format!("{cim}Measurement.PowerSystemResource"),
                &row.equipment,
            );
            obj.add_reference(
                format!("{cim}Measurement.unitSymbol"),
                format!("{cim}{}", kind.unit_symbol()),
            );
            obj.add_reference(
                format!("{cim}Measurement.unitMultiplier"),
                format!("{cim}UnitMultiplier.M"),
            );
            obj.add_attribute(
                format!("{cim}Measurement.measurementType"),
                kind.measurement_type(),
            );
            obj.add_attribute(
                format!("{cim}IdentifiedObject.name"),
                format!("{} Meas {}", row.name, kind.letter()),
            );
            obj.add_attribute(format!("{cim}Analog.minValue"), range.min_value.to_string());
            obj.add_attribute(format!("{cim}Analog.maxValue"), range.max_value.to_string());
            // Synthesized analogs treat the upper limit as the normal value.
            obj.add_attribute(
                format!("{cim}Analog.normalValue"),
                range.max_value.to_string(),
            );
            sv_to_analog.insert(row.sv.clone(), mrid);
            objects.push(obj);
        }

        self.store.insert_objects(&objects, &self.op_graph, true)?;
        Ok(sv_to_analog)
    }

    /// Writes one `AnalogValue` per row: metadata into the OP graph, the
    /// distorted value into the MEAS graph under the same mRID.
    #[allow(clippy::too_many_arguments)]
    fn write_values(
        &mut self,
        rows: &[SvPowerRow],
        ranges: &[MeasurementRange],
        sv_to_analog: &HashMap<String, String>,
        cim: &str,
        scada: &str,
        kind: PowerKind,
        rng: &mut StdRng,
    ) -> CgmesResult<usize> {
        let mut op_objects = Vec::with_capacity(rows.len());
        let mut meas_objects = Vec::with_capacity(rows.len());

        for (row, range) in rows.iter().zip(ranges) {
            let analog = sv_to_analog.get(&row.sv).ok_or_else(|| {
                CgmesError::Store(format!("no analog recorded for SvPowerFlow {}", row.sv))
            })?;
            let mrid = Uuid::new_v4().to_string();

            let mut op = CimObject::new(mrid.clone());
            op.set_type(format!("{cim}AnalogValue"))?;
            op.add_attribute(
                format!("{cim}IdentifiedObject.name"),
                format!("{} {} Measurement Value", row.name, kind.letter()),
            );
            op.add_reference(
                format!("{cim}AnalogValue.Analog"),
                format!("urn:uuid:{analog}"),
            );
            op.add_reference(format!("{cim}AnalogValue.MeasurementValueSource"), scada);
            op.add_attribute(
                format!("{cim}MeasurementValue.sensorSigma"),
                range.sigma.to_string(),
            );
            op_objects.push(op);

            let mut meas = CimObject::new(mrid);
            meas.set_type(format!("{cim}AnalogValue"))?;
            meas.add_attribute(format!("{cim}MeasurementValue.timeStamp"), MEAS_TIMESTAMP);
            meas.add_attribute(
                format!("{cim}AnalogValue.value"),
                range.distort(kind.true_value(row), rng).to_string(),
            );
            meas_objects.push(meas);
        }

        self.store
            .insert_objects(&op_objects, &self.op_graph, true)?;
        self.store
            .insert_objects(&meas_objects, &self.meas_graph, false)?;
        Ok(meas_objects.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::RangeBracket;
    use cgmes_core::{ns, MemoryStore, Table, TripleObject};

    const BASE: &str = "http://localhost:3030/mini";

    fn op() -> GraphName {
        GraphName::named("op")
    }

    fn meas() -> GraphName {
        GraphName::named("meas")
    }

    fn ranges() -> MeasurementRangeSet {
        MeasurementRangeSet::new(vec![RangeBracket {
            from_kv: 100.0,
            to_kv: 220.0,
            range: MeasurementRange {
                min_value: 0.0,
                max_value: 50.0,
                normal_value: 50.0,
                sigma: 1.0,
            },
        }])
        .unwrap()
    }

    fn sources() -> HashMap<MeasurementSource, String> {
        HashMap::from([(
            MeasurementSource::Scada,
            format!("{BASE}/data#_scada-source"),
        )])
    }

    fn row() -> SvPowerRow {
        SvPowerRow {
            sv: format!("{BASE}/data#_sv1"),
            terminal: format!("{BASE}/data#_t1"),
            equipment: format!("{BASE}/data#_gen1"),
            name: "Gen 1".to_string(),
            topological_node: format!("{BASE}/data#_tn1"),
            p: 10.0,
            q: 2.0,
            nominal_voltage: Some(110.0),
            max_p: None,
            min_p: None,
            rated_s: None,
            current_limit: None,
        }
    }

    fn literal_values(store: &MemoryStore, graph: &GraphName, predicate: &str) -> Vec<String> {
        store
            .triples_with_predicate(graph, predicate)
            .iter()
            .map(|t| t.object.value().to_string())
            .collect()
    }

    #[test]
    fn one_terminal_yields_p_and_q_analogs_with_range_limits() {
        let mut store = MemoryStore::new(BASE);
        let set = ranges();
        let mut builder =
            PowerMeasurementBuilder::new(&mut store, &set, sources(), op(), meas());
        let report = builder.build_from_rows(&[row()]).unwrap();

        assert_eq!(report.analogs, 2);
        assert_eq!(report.analog_values, 2);

        let types = literal_values(&store, &op(), &format!("{}Measurement.measurementType", ns::CIM));
        assert_eq!(types, ["ThreePhaseActivePower", "ThreePhaseReactivePower"]);

        let max_pred = format!("{}Analog.maxValue", ns::CIM);
        let normal_pred = format!("{}Analog.normalValue", ns::CIM);
        assert_eq!(literal_values(&store, &op(), &max_pred), ["50", "50"]);
        assert_eq!(literal_values(&store, &op(), &normal_pred), ["50", "50"]);
    }

    #[test]
    fn analog_values_reference_their_analog_by_urn() {
        let mut store = MemoryStore::new(BASE);
        let set = ranges();
        PowerMeasurementBuilder::new(&mut store, &set, sources(), op(), meas())
            .build_from_rows(&[row()])
            .unwrap();

        // Resolve the P analog's subject via its measurement type, then its
        // mRID, then the urn reference pointing back at it.
        let type_pred = format!("{}Measurement.measurementType", ns::CIM);
        let p_subject = store
            .triples_with_predicate(&op(), &type_pred)
            .iter()
            .find(|t| t.object.value() == "ThreePhaseActivePower")
            .unwrap()
            .subject
            .clone();

        let mrid_pred = format!("{}IdentifiedObject.mRID", ns::CIM);
        let p_mrid = store
            .triples_with_predicate(&op(), &mrid_pred)
            .iter()
            .find(|t| t.subject == p_subject)
            .unwrap()
            .object
            .value()
            .to_string();

        let analog_pred = format!("{}AnalogValue.Analog", ns::CIM);
        let refs = store.triples_with_predicate(&op(), &analog_pred);
        assert_eq!(refs.len(), 2);
        assert!(refs
            .iter()
            .any(|t| t.object == TripleObject::Iri(format!("urn:uuid:{p_mrid}"))));
    }

    #[test]
    fn values_stay_near_the_true_flow_within_the_clamp() {
        let mut store = MemoryStore::new(BASE);
        let set = ranges();
        PowerMeasurementBuilder::new(&mut store, &set, sources(), op(), meas())
            .build_from_rows(&[row()])
            .unwrap();

        let value_pred = format!("{}AnalogValue.value", ns::CIM);
        let values: Vec<f64> = literal_values(&store, &meas(), &value_pred)
            .iter()
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        // sigma is 1.0; P pass writes first.
        assert!((values[0] - 10.0).abs() < 6.0, "p value drifted: {}", values[0]);
        assert!((values[1] - 2.0).abs() < 6.0, "q value drifted: {}", values[1]);
        assert!(values.iter().all(|v| (0.0..=50.0).contains(v)));
    }

    #[test]
    fn meas_partition_carries_no_identifier() {
        let mut store = MemoryStore::new(BASE);
        let set = ranges();
        PowerMeasurementBuilder::new(&mut store, &set, sources(), op(), meas())
            .build_from_rows(&[row()])
            .unwrap();

        let mrid_pred = format!("{}IdentifiedObject.mRID", ns::CIM);
        assert!(store.triples_with_predicate(&meas(), &mrid_pred).is_empty());
        let stamps = literal_values(
            &store,
            &meas(),
            &format!("{}MeasurementValue.timeStamp", ns::CIM),
        );
        assert_eq!(stamps, [MEAS_TIMESTAMP, MEAS_TIMESTAMP]);
    }

    #[test]
    fn same_seed_reproduces_the_same_values() {
        let value_pred = format!("{}AnalogValue.value", ns::CIM);
        let run = |seed| {
            let mut store = MemoryStore::new(BASE);
            let set = ranges();
            PowerMeasurementBuilder::new(&mut store, &set, sources(), op(), meas())
                .with_seed(Some(seed))
                .build_from_rows(&[row()])
                .unwrap();
            literal_values(&store, &meas(), &value_pred)
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(7));
    }

    #[test]
    fn missing_nominal_voltage_is_a_range_lookup_error() {
        let mut store = MemoryStore::new(BASE);
        let set = ranges();
        let mut bad = row();
        bad.nominal_voltage = None;
        let err = PowerMeasurementBuilder::new(&mut store, &set, sources(), op(), meas())
            .build_from_rows(&[bad])
            .unwrap_err();
        assert!(
            matches!(err, CgmesError::RangeLookup { ref terminal } if terminal.ends_with("_t1"))
        );
        // Nothing was written.
        assert_eq!(store.graph_len(&op()), 0);
    }

    #[test]
    fn uncovered_voltage_is_a_range_lookup_error() {
        let mut store = MemoryStore::new(BASE);
        let set = ranges();
        let mut bad = row();
        bad.nominal_voltage = Some(380.0);
        let err = PowerMeasurementBuilder::new(&mut store, &set, sources(), op(), meas())
            .build_from_rows(&[bad])
            .unwrap_err();
        assert!(matches!(err, CgmesError::RangeLookup { .. }));
    }

    #[test]
    fn missing_scada_source_is_a_config_error() {
        let mut store = MemoryStore::new(BASE);
        let set = ranges();
        let sources = HashMap::from([(MeasurementSource::Iccp, "http://x".to_string())]);
        let err = PowerMeasurementBuilder::new(&mut store, &set, sources, op(), meas())
            .build_from_rows(&[row()])
            .unwrap_err();
        assert!(matches!(err, CgmesError::Config(_)));
    }

    #[test]
    fn rating_prefers_operating_bounds_over_fallbacks() {
        let mut r = row();
        assert_eq!(r.rating_mva(), None);

        r.current_limit = Some(500.0);
        assert_eq!(r.rating_mva(), Some(55.0)); // 500 A * 110 kV / 1000

        r.rated_s = Some(40.0);
        assert_eq!(r.rating_mva(), Some(40.0));

        r.max_p = Some(30.0);
        r.min_p = Some(-35.0);
        assert_eq!(r.rating_mva(), Some(35.0));
    }

    #[test]
    fn fetch_parses_the_scripted_power_table() {
        let mut store = MemoryStore::new(BASE);
        let mut table = Table::new([
            "sv", "term", "eq", "name", "tn", "p", "q", "nomV", "maxP", "minP", "ratedS", "maxI",
        ]);
        table.push_row(vec![
            Some(format!("{BASE}/data#_sv1")),
            Some(format!("{BASE}/data#_t1")),
            Some(format!("{BASE}/data#_gen1")),
            Some("Gen 1".to_string()),
            Some(format!("{BASE}/data#_tn1")),
            Some("10.0".to_string()),
            Some("2.0".to_string()),
            Some("110".to_string()),
            None,
            None,
            None,
            Some("500".to_string()),
        ]);
        store.script_query_result(table);

        let rows = fetch_sv_power_rows(&mut store).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Gen 1");
        assert_eq!(rows[0].p, 10.0);
        assert_eq!(rows[0].nominal_voltage, Some(110.0));
        assert_eq!(rows[0].max_p, None);
        assert_eq!(rows[0].current_limit, Some(500.0));
    }

    #[test]
    fn fetch_rejects_rows_without_required_bindings() {
        let mut store = MemoryStore::new(BASE);
        let mut table = Table::new([
            "sv", "term", "eq", "name", "tn", "p", "q", "nomV", "maxP", "minP", "ratedS", "maxI",
        ]);
        table.push_row(vec![
            None,
            Some(format!("{BASE}/data#_t1")),
            Some(format!("{BASE}/data#_gen1")),
            Some("Gen 1".to_string()),
            Some(format!("{BASE}/data#_tn1")),
            Some("10.0".to_string()),
            Some("2.0".to_string()),
            None,
            None,
            None,
            None,
            None,
        ]);
        store.script_query_result(table);

        let err = fetch_sv_power_rows(&mut store).unwrap_err();
        assert!(matches!(err, CgmesError::Store(_)));
    }
}
