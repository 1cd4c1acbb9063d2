//! CIM/XML graph exporter
//!
//! Serializes a named graph into an RDF/XML document that can be re-imported
//! by [`crate::import`]. The model header is always the first element; the
//! remaining subjects follow in first-seen triple order.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use cgmes_core::{
    display_iri, ns, CgmesError, CgmesResult, CimObject, GraphName, IriPolicy, Triple,
    TripleObject, TripleStore,
};
use tracing::debug;

const DEFAULT_TYPE: &str = "rdf:Description";

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn xml_escape_attr(value: &str) -> String {
    xml_escape(value).replace('"', "&quot;")
}

/// Exports one graph of a [`TripleStore`] to a CIM/XML file.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlExporter {
    policy: IriPolicy,
}

impl XmlExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: IriPolicy) -> Self {
        Self { policy }
    }

    /// Export `source_graph` to exactly one file at `path`.
    ///
    /// The source graph is not mutated. Header and structural errors are
    /// raised before the file is created, so a failed export leaves no
    /// partial output behind.
    pub fn export<S: TripleStore>(
        &self,
        store: &S,
        source_graph: &GraphName,
        path: impl AsRef<Path>,
    ) -> CgmesResult<()> {
        let triples = store.select_triples(source_graph)?;
        let grouped = group_by_subject(&triples);
        let header = find_model_header(&grouped)?;

        let header_subject = header.0.clone();
        let mut objects = Vec::with_capacity(grouped.len());
        objects.push(self.build_object(store, header)?);
        for group in &grouped {
            if group.0 != header_subject {
                objects.push(self.build_object(store, group)?);
            }
        }

        debug!(
            graph = %source_graph,
            objects = objects.len(),
            "serializing CIM/XML export"
        );
        self.write_document(store, &objects, path.as_ref())
    }

    fn build_object<S: TripleStore>(
        &self,
        store: &S,
        group: &(String, Vec<Triple>),
    ) -> CgmesResult<CimObject> {
        let (subject, triples) = group;
        let prefixes = store.prefixes();
        let mut object = CimObject::new(display_iri(subject, store.base_url(), self.policy));
        for triple in triples {
            if triple.predicate == ns::RDF_TYPE {
                object.set_type(prefixes.compress(triple.object.value()))?;
            } else {
                match &triple.object {
                    TripleObject::Iri(target) => object.add_reference(
                        prefixes.compress(&triple.predicate),
                        display_iri(target, store.base_url(), self.policy),
                    ),
                    TripleObject::Literal(value) => {
                        object.add_attribute(prefixes.compress(&triple.predicate), value)
                    }
                }
            }
        }
        Ok(object)
    }

    fn write_document<S: TripleStore>(
        &self,
        store: &S,
        objects: &[CimObject],
        path: &Path,
    ) -> CgmesResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        write!(writer, "<rdf:RDF")?;
        for (prefix, namespace) in store.prefixes().iter() {
            write!(
                writer,
                " xmlns:{}=\"{}\"",
                prefix,
                xml_escape_attr(namespace)
            )?;
        }
        writeln!(writer, ">")?;

        for object in objects {
            let element = object.cim_type().unwrap_or(DEFAULT_TYPE);
            writeln!(
                writer,
                "  <{} rdf:about=\"{}\">",
                element,
                xml_escape_attr(&object.iri)
            )?;
            for (predicate, value) in object.attributes() {
                writeln!(
                    writer,
                    "    <{pred}>{value}</{pred}>",
                    pred = predicate,
                    value = xml_escape(value)
                )?;
            }
            for (predicate, target) in object.references() {
                writeln!(
                    writer,
                    "    <{} rdf:resource=\"{}\"/>",
                    predicate,
                    xml_escape_attr(target)
                )?;
            }
            writeln!(writer, "  </{}>", element)?;
        }

        writeln!(writer, "</rdf:RDF>")?;
        writer.flush()?;
        Ok(())
    }
}

/// Group triples by subject, preserving first-seen subject order.
fn group_by_subject(triples: &[Triple]) -> Vec<(String, Vec<Triple>)> {
    let mut groups: Vec<(String, Vec<Triple>)> = Vec::new();
    for triple in triples {
        match groups.iter_mut().find(|(s, _)| s == &triple.subject) {
            Some((_, group)) => group.push(triple.clone()),
            None => groups.push((triple.subject.clone(), vec![triple.clone()])),
        }
    }
    groups
}

/// The unique model-header group (`md:FullModel` or `dm:DifferenceModel`).
fn find_model_header(
    grouped: &[(String, Vec<Triple>)],
) -> CgmesResult<&(String, Vec<Triple>)> {
    let is_header_type = |t: &Triple| {
        t.predicate == ns::RDF_TYPE
            && matches!(
                t.object.value(),
                ns::MD_FULL_MODEL | ns::DM_DIFFERENCE_MODEL
            )
    };
    let mut headers = grouped
        .iter()
        .filter(|(_, triples)| triples.iter().any(is_header_type));
    let first = headers.next().ok_or(CgmesError::MissingHeader)?;
    let extra = headers.count();
    if extra > 0 {
        return Err(CgmesError::MultipleHeaders { count: extra + 1 });
    }
    Ok(first)
}
