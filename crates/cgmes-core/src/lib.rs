//! # cgmes-core: CGMES Triple Model Core
//!
//! Shared data model for the CGMES suite: RDF triples with explicit object
//! kinds, in-memory CIM objects, the model header, identifier
//! canonicalization, and the triple-store capability trait.
//!
//! ## Design Philosophy
//!
//! The triple store is the system of record. Everything in this crate is
//! transient: [`CimObject`]s and lookup tables are rebuilt per operation and
//! never cached across calls. The store itself is consumed through the
//! [`TripleStore`] trait so an in-memory fake ([`MemoryStore`]) can back the
//! test suite without a running service.
//!
//! ## Identifier forms
//!
//! One object has up to three IRI spellings:
//!
//! | Form | Example | Where |
//! |------|---------|-------|
//! | dataset-scoped | `http://host/ds/data#_<mrid>` | inside the store |
//! | relative fragment | `#_<mrid>` | documents, default policy |
//! | urn | `urn:uuid:<mrid>` | documents, alternate policy |
//!
//! [`IriPolicy`] selects the document form on export; import resolves the
//! selected form back to the dataset-scoped IRI (urns are only rewritten
//! under the urn policy, so genuine urn identities survive otherwise).

pub mod error;
pub mod header;
pub mod iri;
pub mod ns;
pub mod object;
pub mod store;
pub mod triple;

pub use error::{CgmesError, CgmesResult};
pub use header::ModelHeader;
pub use iri::{data_iri, display_iri, resolve_iri, IriPolicy, PrefixTable};
pub use object::CimObject;
pub use store::{MemoryStore, Table, TableRow, TripleStore};
pub use triple::{GraphName, Triple, TripleObject};
