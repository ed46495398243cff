//! Conformance testing against a corpus of known-good canonical outputs.
//!
//! Outputs are compared as raw bytes, not parsed structures: two dumps that
//! load to the same value but differ in quoting or layout are a failure.

pub mod corpus;

pub use corpus::{
    run_vector, Corpus, CorpusResults, CorpusRunner, Expected, TestResult, TestVector,
    VectorOptions,
};

use thiserror::Error;

/// Result type for conformance operations.
pub type ConformanceResult<T> = Result<T, ConformanceError>;

/// Errors that can occur while loading a corpus.
#[derive(Debug, Error)]
pub enum ConformanceError {
    /// The corpus file could not be read.
    #[error("failed to read corpus file {path}: {source}")]
    Io {
        /// Corpus path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The corpus is not valid JSON or does not match the format.
    #[error("failed to parse corpus JSON: {0}")]
    Json(#[from] serde_json::Error),
}
