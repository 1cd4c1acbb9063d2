//! Triple-store capability.
//!
//! The store itself (query execution, dataset lifecycle) is an external
//! collaborator; this module defines the surface the suite consumes, plus an
//! in-memory implementation that backs the test suite without a running
//! service. All operations are blocking; collaborator failures surface as
//! [`CgmesError::Store`] and propagate unmodified.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{CgmesError, CgmesResult};
use crate::iri::{data_iri, PrefixTable};
use crate::ns;
use crate::object::CimObject;
use crate::triple::{GraphName, Triple};

/// Tabular result of a free-form query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        self.rows.iter().map(move |cells| TableRow {
            columns: &self.columns,
            cells,
        })
    }
}

/// Borrowed view of one result row with by-name access.
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    columns: &'a [String],
    cells: &'a [Option<String>],
}

impl<'a> TableRow<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.cells.get(idx)?.as_deref()
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column)?.parse().ok()
    }
}

/// Read/write surface of the triple store consumed by the suite.
pub trait TripleStore {
    /// Dataset base URL; object IRIs live under `<base>/data#_`.
    fn base_url(&self) -> &str;

    /// Namespace-prefix table of the dataset.
    fn prefixes(&self) -> &PrefixTable;

    /// All triples of a graph as explicit-kind rows, in stored order.
    fn select_triples(&self, graph: &GraphName) -> CgmesResult<Vec<Triple>>;

    /// Execute a read query returning tabular rows.
    fn query(&mut self, sparql: &str) -> CgmesResult<Table>;

    /// Insert a triple batch into a graph in one call.
    fn insert_triples(&mut self, triples: &[Triple], graph: &GraphName) -> CgmesResult<()>;

    /// Insert one stored row per object; subjects are minted from the object
    /// mRID. With `include_mrid` the identifier is also persisted as a
    /// `cim:IdentifiedObject.mRID` triple.
    fn insert_objects(
        &mut self,
        objects: &[CimObject],
        graph: &GraphName,
        include_mrid: bool,
    ) -> CgmesResult<()> {
        let mut triples = Vec::new();
        for obj in objects {
            let subject = data_iri(self.base_url(), &obj.iri);
            if let Some(cim_type) = obj.cim_type() {
                triples.push(Triple::iri(&subject, ns::RDF_TYPE, cim_type));
            }
            if include_mrid {
                triples.push(Triple::literal(
                    &subject,
                    format!("{}IdentifiedObject.mRID", ns::CIM),
                    &obj.iri,
                ));
            }
            for (predicate, value) in obj.attributes() {
                triples.push(Triple::literal(&subject, predicate, value));
            }
            for (predicate, target) in obj.references() {
                triples.push(Triple::iri(&subject, predicate, target));
            }
        }
        self.insert_triples(&triples, graph)
    }

    /// Remove a graph and everything in it.
    fn drop_graph(&mut self, graph: &GraphName) -> CgmesResult<()>;
}

/// In-memory [`TripleStore`].
///
/// Triple operations behave like a real store; free-form queries are served
/// from a FIFO of scripted results, since evaluating SPARQL is the
/// collaborator's job, not this crate's.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    base_url: String,
    prefixes: PrefixTable,
    graphs: BTreeMap<String, Vec<Triple>>,
    scripted_queries: VecDeque<Table>,
}

impl MemoryStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            prefixes: PrefixTable::cgmes_default(),
            graphs: BTreeMap::new(),
            scripted_queries: VecDeque::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str, namespace: &str) -> Self {
        self.prefixes.insert(prefix, namespace);
        self
    }

    /// Queue the result of the next [`TripleStore::query`] call.
    pub fn script_query_result(&mut self, table: Table) {
        self.scripted_queries.push_back(table);
    }

    /// Number of triples currently stored in a graph.
    pub fn graph_len(&self, graph: &GraphName) -> usize {
        self.graphs.get(graph.key()).map_or(0, Vec::len)
    }

    /// Triples of a graph matching a predicate IRI.
    pub fn triples_with_predicate(&self, graph: &GraphName, predicate: &str) -> Vec<&Triple> {
        self.graphs
            .get(graph.key())
            .into_iter()
            .flatten()
            .filter(|t| t.predicate == predicate)
            .collect()
    }
}

impl TripleStore for MemoryStore {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn prefixes(&self) -> &PrefixTable {
        &self.prefixes
    }

    fn select_triples(&self, graph: &GraphName) -> CgmesResult<Vec<Triple>> {
        Ok(self.graphs.get(graph.key()).cloned().unwrap_or_default())
    }

    fn query(&mut self, sparql: &str) -> CgmesResult<Table> {
        self.scripted_queries.pop_front().ok_or_else(|| {
            CgmesError::Store(format!(
                "memory store has no scripted result for query: {}",
                sparql.split_whitespace().take(8).collect::<Vec<_>>().join(" ")
            ))
        })
    }

    fn insert_triples(&mut self, triples: &[Triple], graph: &GraphName) -> CgmesResult<()> {
        self.graphs
            .entry(graph.key().to_string())
            .or_default()
            .extend_from_slice(triples);
        Ok(())
    }

    fn drop_graph(&mut self, graph: &GraphName) -> CgmesResult<()> {
        self.graphs.remove(graph.key());
        Ok(())
    }
}
