//! In-memory CIM object: one subject with its attributes and references.

use serde::{Deserialize, Serialize};

use crate::error::{CgmesError, CgmesResult};

/// One CIM object, rebuilt per operation and never cached across calls.
///
/// Attribute and reference maps keep insertion order so serialized output is
/// deterministic. An object has exactly one type; until it is set the
/// serializer falls back to a generic `rdf:Description` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CimObject {
    /// Identity: a display IRI for export, a bare mRID for insertion.
    pub iri: String,
    cim_type: Option<String>,
    attributes: Vec<(String, String)>,
    references: Vec<(String, String)>,
}

impl CimObject {
    pub fn new(iri: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            ..Self::default()
        }
    }

    /// Set the object type. A second call is a structural error: one subject
    /// must not carry two rdf:type statements.
    pub fn set_type(&mut self, cim_type: impl Into<String>) -> CgmesResult<()> {
        if self.cim_type.is_some() {
            return Err(CgmesError::DuplicateType {
                iri: self.iri.clone(),
            });
        }
        self.cim_type = Some(cim_type.into());
        Ok(())
    }

    pub fn cim_type(&self) -> Option<&str> {
        self.cim_type.as_deref()
    }

    pub fn add_attribute(&mut self, predicate: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((predicate.into(), value.into()));
    }

    pub fn add_reference(&mut self, predicate: impl Into<String>, target: impl Into<String>) {
        self.references.push((predicate.into(), target.into()));
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.references.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Attribute value by predicate, first match.
    pub fn attribute(&self, predicate: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(p, _)| p == predicate)
            .map(|(_, v)| v.as_str())
    }

    /// Reference target by predicate, first match.
    pub fn reference(&self, predicate: &str) -> Option<&str> {
        self.references
            .iter()
            .find(|(p, _)| p == predicate)
            .map(|(_, v)| v.as_str())
    }
}
