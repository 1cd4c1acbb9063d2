//! Unified error types for the CGMES suite
//!
//! [`CgmesError`] covers every failure mode of the codec and synthesis
//! crates. Structural and header errors abort the export/import call that
//! raised them; triple-store failures are wrapped in [`CgmesError::Store`]
//! and propagated unmodified.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for all CGMES operations.
#[derive(Error, Debug)]
pub enum CgmesError {
    /// A subject carries more than one rdf:type triple.
    #[error("multiple rdf:type definitions for {iri}")]
    DuplicateType { iri: String },

    /// The exported graph contains no FullModel/DifferenceModel subject.
    #[error("graph does not contain a model header (FullModel or DifferenceModel)")]
    MissingHeader,

    /// The exported graph contains more than one model-header subject.
    #[error("graph contains {count} model headers, expected exactly one")]
    MultipleHeaders { count: usize },

    /// A document could not be parsed; the whole import batch is discarded.
    #[error("failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// A measurement row has no nominal voltage, or no range bracket covers it.
    #[error("no measurement range for terminal {terminal}")]
    RangeLookup { terminal: String },

    /// I/O errors (file access, output writing)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Triple-store collaborator failures, passed through verbatim
    #[error("store error: {0}")]
    Store(String),

    /// Configuration errors (range tables, source maps)
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using CgmesError.
pub type CgmesResult<T> = Result<T, CgmesError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for CgmesError {
    fn from(err: anyhow::Error) -> Self {
        CgmesError::Store(err.to_string())
    }
}
