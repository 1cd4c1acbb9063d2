//! Model header (`md:FullModel`) value object.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ns;
use crate::triple::Triple;

fn format_current_time() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn fresh_urn() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

/// Metadata header of a CGMES profile graph.
///
/// Every exported graph carries exactly one, serialized before all other
/// objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHeader {
    /// Profile URI, e.g. `http://entsoe.eu/CIM/StateVariables/4/1`.
    pub profile: String,
    /// `urn:uuid:` identity of the model.
    pub iri: String,
    pub description: String,
    pub version: u32,
    pub modeling_authority_set: String,
    /// FullModel URNs of the profiles this model depends on.
    pub dependent_on: Vec<String>,
    /// Scenario time, ISO-8601 UTC at second precision.
    pub scenario_time: String,
    /// Creation time, ISO-8601 UTC at second precision.
    pub created: String,
}

impl ModelHeader {
    pub fn new(profile: impl Into<String>) -> Self {
        let now = format_current_time();
        Self {
            profile: profile.into(),
            iri: fresh_urn(),
            description: "Model".to_string(),
            version: 1,
            modeling_authority_set: "cgmes-suite".to_string(),
            dependent_on: Vec::new(),
            scenario_time: now.clone(),
            created: now,
        }
    }

    /// The header as triples, rdf:type first, metadata predicates in the
    /// order consumers expect, dependency links last.
    pub fn to_triples(&self) -> Vec<Triple> {
        let md = |local: &str| format!("{}Model.{}", ns::MD, local);
        let mut triples = vec![
            Triple::iri(&self.iri, ns::RDF_TYPE, ns::MD_FULL_MODEL),
            Triple::literal(&self.iri, md("scenarioTime"), &self.scenario_time),
            Triple::literal(&self.iri, md("created"), &self.created),
            Triple::literal(&self.iri, md("description"), &self.description),
            Triple::literal(&self.iri, md("version"), self.version.to_string()),
            // profile URIs are references; a literal spelling would not
            // survive scheme classification on re-import
            Triple::iri(&self.iri, md("profile"), &self.profile),
            Triple::literal(
                &self.iri,
                md("modelingAuthoritySet"),
                &self.modeling_authority_set,
            ),
        ];
        for dep in &self.dependent_on {
            triples.push(Triple::iri(&self.iri, md("DependentOn"), dep));
        }
        triples
    }
}
