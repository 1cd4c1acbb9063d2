//! Identifier canonicalization.
//!
//! CGMES objects live at `"<base>/data#_<mrid>"` inside one dataset. On
//! export those IRIs are rewritten into one of two document forms, selected
//! by [`IriPolicy`]; importing under the same policy resolves them back into
//! the dataset-scoped IRI, so either export policy round-trips.

use serde::{Deserialize, Serialize};

/// How dataset-scoped IRIs are rendered in an exported document.
///
/// The two forms are mutually exclusive; an exporter picks one and applies
/// it to subjects and references alike. `RelativeFragment` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IriPolicy {
    /// `<base>/data#_<id>` becomes the document-relative fragment `#_<id>`.
    #[default]
    RelativeFragment,
    /// `<base>/data#_<id>` becomes `urn:uuid:<id>`.
    UrnUuid,
}

/// Suffix separating the dataset data IRI from the mRID fragment.
const DATA_FRAGMENT: &str = "/data#_";

/// Rewrite a full IRI into its document form.
///
/// IRIs outside the dataset scope (no `<base>/data#_` prefix) pass through
/// unchanged.
pub fn display_iri(full: &str, base_url: &str, policy: IriPolicy) -> String {
    let scope = format!("{}{}", base_url, DATA_FRAGMENT);
    match full.strip_prefix(scope.as_str()) {
        Some(id) => match policy {
            IriPolicy::RelativeFragment => format!("#_{}", id),
            IriPolicy::UrnUuid => format!("urn:uuid:{}", id),
        },
        None => full.to_string(),
    }
}

/// Resolve a document IRI back into its dataset-scoped form.
///
/// Inverse of [`display_iri`] under the same policy. Relative fragments
/// always resolve against the dataset (public-id behavior); `urn:uuid:`
/// values are rewritten only under [`IriPolicy::UrnUuid`], since under the
/// fragment policy a urn is a genuine external identity (model headers,
/// profile dependencies) and must pass through unchanged.
pub fn resolve_iri(value: &str, base_url: &str, policy: IriPolicy) -> String {
    if let Some(id) = value.strip_prefix("#_") {
        return format!("{}{}{}", base_url, DATA_FRAGMENT, id);
    }
    if policy == IriPolicy::UrnUuid {
        if let Some(id) = value.strip_prefix("urn:uuid:") {
            return format!("{}{}{}", base_url, DATA_FRAGMENT, id);
        }
    }
    value.to_string()
}

/// Dataset-scoped IRI for a bare mRID.
pub fn data_iri(base_url: &str, mrid: &str) -> String {
    format!("{}{}{}", base_url, DATA_FRAGMENT, mrid)
}

/// Ordered prefix → namespace table used for document namespace
/// declarations and predicate compression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixTable {
    entries: Vec<(String, String)>,
}

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-seeded with the namespaces every CGMES document declares.
    pub fn cgmes_default() -> Self {
        let mut table = Self::new();
        table.insert("rdf", crate::ns::RDF);
        table.insert("cim", crate::ns::CIM);
        table.insert("md", crate::ns::MD);
        table.insert("dm", crate::ns::DM);
        table
    }

    /// Add or replace a prefix binding, preserving first-insertion order.
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        let prefix = prefix.into();
        let namespace = namespace.into();
        if let Some(entry) = self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            entry.1 = namespace;
        } else {
            self.entries.push((prefix, namespace));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, n)| (p.as_str(), n.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Namespace bound to a prefix, if any.
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, n)| n.as_str())
    }

    /// The `cim:` namespace, required for unit-symbol IRIs.
    pub fn cim_namespace(&self) -> Option<&str> {
        self.namespace("cim")
    }

    /// Compress a full predicate/type IRI into a prefixed name.
    ///
    /// Longest-namespace match, so a namespace that is a prefix of another
    /// never shadows it and the result does not depend on table order. IRIs
    /// matching no namespace are returned unchanged.
    pub fn compress(&self, iri: &str) -> String {
        let best = self
            .entries
            .iter()
            .filter(|(_, ns)| iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len());
        match best {
            Some((prefix, ns)) => format!("{}:{}", prefix, &iri[ns.len()..]),
            None => iri.to_string(),
        }
    }

    /// Expand a prefixed name back into a full IRI.
    ///
    /// Names with an unknown prefix (or no prefix at all) are returned
    /// unchanged.
    pub fn expand(&self, name: &str) -> String {
        match name.split_once(':') {
            Some((prefix, local)) => match self.namespace(prefix) {
                Some(ns) => format!("{}{}", ns, local),
                None => name.to_string(),
            },
            None => name.to_string(),
        }
    }
}
