//! RDF triple primitives.
//!
//! Triples keep their object kind explicit: whether a value is an entity
//! reference or a literal is decided when the triple is built, never
//! re-inferred from syntax downstream.

use serde::{Deserialize, Serialize};

/// Object position of a triple: an IRI reference or a string literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripleObject {
    Iri(String),
    Literal(String),
}

impl TripleObject {
    /// Classify a raw value the way the importer formats parsed terms:
    /// values starting with a recognized IRI scheme become references,
    /// everything else becomes a string literal.
    pub fn from_raw(value: &str) -> Self {
        if value.starts_with("http:") || value.starts_with("urn:") {
            TripleObject::Iri(value.to_string())
        } else {
            TripleObject::Literal(value.to_string())
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, TripleObject::Iri(_))
    }

    /// The wrapped value, without kind information.
    pub fn value(&self) -> &str {
        match self {
            TripleObject::Iri(v) | TripleObject::Literal(v) => v,
        }
    }
}

/// A subject-predicate-object statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: TripleObject,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: TripleObject,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }

    pub fn iri(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self::new(subject, predicate, TripleObject::Iri(object.into()))
    }

    pub fn literal(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self::new(subject, predicate, TripleObject::Literal(object.into()))
    }
}

/// Target of a store operation: the default graph or a named graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphName {
    Default,
    Named(String),
}

impl GraphName {
    pub fn named(name: impl Into<String>) -> Self {
        GraphName::Named(name.into())
    }

    /// Storage key; the default graph uses the `"default"` sentinel.
    pub fn key(&self) -> &str {
        match self {
            GraphName::Default => "default",
            GraphName::Named(name) => name,
        }
    }
}

impl std::fmt::Display for GraphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
