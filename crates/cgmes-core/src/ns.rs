//! Namespace IRIs shared across the suite.

/// RDF syntax namespace.
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// `rdf:type` predicate.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// CIM 100 schema namespace.
pub const CIM: &str = "http://iec.ch/TC57/CIM100#";

/// Model-description namespace (`md:`), home of `FullModel`.
pub const MD: &str = "http://iec.ch/TC57/61970-552/ModelDescription/1#";

/// Difference-model namespace (`dm:`).
pub const DM: &str = "http://iec.ch/TC57/61970-552/DifferenceModel/1#";

/// `md:FullModel` type IRI.
pub const MD_FULL_MODEL: &str = "http://iec.ch/TC57/61970-552/ModelDescription/1#FullModel";

/// `dm:DifferenceModel` type IRI.
pub const DM_DIFFERENCE_MODEL: &str =
    "http://iec.ch/TC57/61970-552/DifferenceModel/1#DifferenceModel";

/// Profile URI of the ENTSO-E state-variables profile.
pub const SV_PROFILE: &str = "http://entsoe.eu/CIM/StateVariables/4/1";
