//! RDF/XML graph importer
//!
//! Parses CIM/XML documents into flat triple lists and inserts them into a
//! target named graph. Relative fragment IRIs resolve against the dataset
//! base URL, so re-imported documents land on the same dataset-scoped
//! subjects they were exported from.

use std::{fs, path::Path};

use cgmes_core::{
    ns, resolve_iri, CgmesError, CgmesResult, GraphName, IriPolicy, PrefixTable, Triple,
    TripleObject, TripleStore,
};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use tracing::debug;

/// Imports CIM/XML files into one target graph of a [`TripleStore`].
///
/// The [`IriPolicy`] must match the one the documents were exported with;
/// resolution is its inverse.
#[derive(Debug, Clone)]
pub struct XmlImporter {
    target_graph: GraphName,
    policy: IriPolicy,
}

impl XmlImporter {
    pub fn new(target_graph: GraphName) -> Self {
        Self {
            target_graph,
            policy: IriPolicy::default(),
        }
    }

    pub fn with_policy(target_graph: GraphName, policy: IriPolicy) -> Self {
        Self {
            target_graph,
            policy,
        }
    }

    /// Parse one document and insert its triples in a single call.
    ///
    /// A malformed document aborts the import; nothing is inserted.
    pub fn import_file<S: TripleStore>(
        &self,
        store: &mut S,
        path: impl AsRef<Path>,
    ) -> CgmesResult<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let triples = parse_document(&text, store.base_url(), self.policy, path)?;
        let count = triples.len();
        store.insert_triples(&triples, &self.target_graph)?;
        debug!(file = %path.display(), triples = count, "imported CIM/XML file");
        Ok(count)
    }

    /// Parse every `.xml`/`.rdf` file in a directory, in lexicographic
    /// filename order, then perform one combined insert.
    ///
    /// One malformed document aborts the whole batch; nothing is inserted.
    pub fn import_directory<S: TripleStore>(
        &self,
        store: &mut S,
        dir: impl AsRef<Path>,
    ) -> CgmesResult<usize> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_rdf_xml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| {
                    let lower = e.to_ascii_lowercase();
                    lower == "xml" || lower == "rdf"
                })
                .unwrap_or(false);
            if is_rdf_xml {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(CgmesError::Parse {
                path: dir.to_path_buf(),
                message: "directory contains no RDF/XML files".to_string(),
            });
        }
        files.sort();

        let mut triples = Vec::new();
        for path in &files {
            let text = fs::read_to_string(path)?;
            triples.extend(parse_document(&text, store.base_url(), self.policy, path)?);
        }
        let count = triples.len();
        store.insert_triples(&triples, &self.target_graph)?;
        debug!(
            dir = %dir.display(),
            files = files.len(),
            triples = count,
            "imported CIM/XML directory"
        );
        Ok(count)
    }
}

/// Parse one RDF/XML document into raw triples.
///
/// Values of text properties are classified by IRI scheme; `rdf:resource`
/// targets are references by construction. `path` only tags errors.
pub fn parse_document(
    text: &str,
    base_url: &str,
    policy: IriPolicy,
    path: &Path,
) -> CgmesResult<Vec<Triple>> {
    let parse_err = |message: String| CgmesError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut prefixes = PrefixTable::new();
    let mut triples = Vec::new();
    let mut depth = 0usize;
    let mut subject: Option<String> = None;
    let mut predicate: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                match depth {
                    0 => collect_namespaces(e, &mut prefixes).map_err(&parse_err)?,
                    1 => {
                        let s = subject_of(e, base_url, policy, &prefixes, &mut triples)
                            .map_err(&parse_err)?;
                        subject = Some(s);
                    }
                    _ => {
                        let name = qualified_name(e).map_err(&parse_err)?;
                        predicate = Some(prefixes.expand(&name));
                    }
                }
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => match depth {
                1 => {
                    // object with no properties; still contributes its type
                    subject_of(e, base_url, policy, &prefixes, &mut triples).map_err(&parse_err)?;
                }
                2 => {
                    let s = subject
                        .as_ref()
                        .ok_or_else(|| parse_err("property outside of object".to_string()))?;
                    if let Some(resource) = attribute(e, "rdf:resource").map_err(&parse_err)? {
                        let name = qualified_name(e).map_err(&parse_err)?;
                        triples.push(Triple::new(
                            s,
                            prefixes.expand(&name),
                            TripleObject::Iri(resolve_iri(&resource, base_url, policy)),
                        ));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let (Some(s), Some(p)) = (subject.as_ref(), predicate.as_ref()) {
                    let value = e
                        .unescape()
                        .map_err(|e| parse_err(e.to_string()))?
                        .trim()
                        .to_string();
                    triples.push(Triple::new(s, p, TripleObject::from_raw(&value)));
                }
            }
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| parse_err("unbalanced end tag".to_string()))?;
                match depth {
                    1 => subject = None,
                    2 => predicate = None,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(parse_err(err.to_string())),
        }
    }

    if depth != 0 {
        return Err(parse_err("unexpected end of document".to_string()));
    }
    Ok(triples)
}

/// Subject IRI of an object element; also emits its rdf:type triple when the
/// element is a concrete CIM type rather than `rdf:Description`.
fn subject_of(
    e: &BytesStart,
    base_url: &str,
    policy: IriPolicy,
    prefixes: &PrefixTable,
    triples: &mut Vec<Triple>,
) -> Result<String, String> {
    let name = qualified_name(e)?;
    let about = attribute(e, "rdf:about")?;
    let id = attribute(e, "rdf:ID")?;
    let subject = match (about, id) {
        (Some(about), _) => resolve_iri(&about, base_url, policy),
        (None, Some(id)) => resolve_iri(&format!("#{}", id), base_url, policy),
        (None, None) => return Err(format!("element <{}> has no rdf:about or rdf:ID", name)),
    };
    if name != "rdf:Description" {
        triples.push(Triple::new(
            &subject,
            ns::RDF_TYPE,
            TripleObject::Iri(prefixes.expand(&name)),
        ));
    }
    Ok(subject)
}

fn collect_namespaces(e: &BytesStart, prefixes: &mut PrefixTable) -> Result<(), String> {
    let name = qualified_name(e)?;
    if name != "rdf:RDF" {
        return Err(format!("expected rdf:RDF document root, found <{}>", name));
    }
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|e| e.to_string())?;
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            let namespace = attr.unescape_value().map_err(|e| e.to_string())?;
            prefixes.insert(prefix, namespace.into_owned());
        }
    }
    Ok(())
}

fn qualified_name(e: &BytesStart) -> Result<String, String> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|e| e.to_string())
}

fn attribute(e: &BytesStart, key: &str) -> Result<Option<String>, String> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
