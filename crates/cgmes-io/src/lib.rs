//! # cgmes-io: CGMES Graph ↔ CIM/XML Codec
//!
//! Bidirectional codec between named graphs of a
//! [`cgmes_core::TripleStore`] and ordered CIM/XML documents.
//!
//! ## Export ([`export::XmlExporter`])
//!
//! 1. Fetch all triples of the source graph (explicit object kinds)
//! 2. Group by subject; locate the unique model header
//!    (`md:FullModel`/`dm:DifferenceModel`) — zero or multiple headers fail
//!    the export
//! 3. Serialize header-first, remaining subjects in first-seen order, with
//!    predicates compressed against the dataset prefix table and
//!    dataset-scoped IRIs rewritten per [`cgmes_core::IriPolicy`]
//!
//! ## Import ([`import::XmlImporter`])
//!
//! Parses one file or a directory of files (lexicographic order, one
//! combined insert) into flat triples. Relative fragments resolve against
//! the dataset base URL; property values are classified as IRIs or literals
//! by scheme. A malformed document aborts the batch with the offending path
//! in the error — a broken file never half-imports.

pub mod export;
pub mod import;

pub use export::XmlExporter;
pub use import::{parse_document, XmlImporter};
