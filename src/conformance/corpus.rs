//! Corpus-based conformance testing.
//!
//! Loads vectors from a JSON corpus and runs each one through
//! [`canonicalize`], comparing the exact output bytes or the error kind.
//!
//! ```json
//! {
//!   "manifest": { "format_version": "1", "description": "..." },
//!   "vectors": [
//!     { "id": "sort-basic", "input": "b: 1\na: 2\n", "expected": { "ok": "a: 2\nb: 1\n" } },
//!     { "id": "empty", "input": "", "expected": { "err": "EmptyInputError" } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{ConformanceError, ConformanceResult};
use crate::canonicalize::canonicalize;
use crate::error::{ErrorKind, SortResult};
use crate::options::Options;

/// Corpus metadata.
#[derive(Debug, Deserialize)]
pub struct CorpusManifest {
    /// Format version of the corpus file.
    pub format_version: String,
    /// What the corpus covers.
    #[serde(default)]
    pub description: String,
}

/// A corpus containing test vectors.
#[derive(Debug, Deserialize)]
pub struct Corpus {
    /// Corpus metadata.
    pub manifest: CorpusManifest,
    /// List of test vectors.
    pub vectors: Vec<TestVector>,
}

/// Options a vector may set; anything omitted keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VectorOptions {
    /// `safe` flag
    pub safe: Option<bool>,
    /// Schema name, resolved like a user-supplied one
    pub schema: Option<String>,
    /// Pinned file name
    pub filename: Option<String>,
    /// Line width
    pub line_width: Option<usize>,
    /// Check mode
    pub check_ordered: bool,
}

impl VectorOptions {
    /// Build canonicalizer options.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` for an unknown schema name.
    pub fn to_options(&self) -> SortResult<Options> {
        let mut options = Options::default().with_check_ordered(self.check_ordered);
        if let Some(safe) = self.safe {
            options = options.with_safe(safe);
        }
        if let Some(name) = &self.schema {
            options = options.with_schema_name(name)?;
        }
        if let Some(filename) = &self.filename {
            options = options.with_filename(filename.clone());
        }
        if let Some(width) = self.line_width {
            options = options.with_line_width(width);
        }
        Ok(options)
    }
}

/// Expected outcome of a vector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expected {
    /// Canonical output text
    Ok(String),
    /// Error kind name, e.g. `ParseError`
    Err(String),
}

/// A single test vector.
#[derive(Debug, Deserialize)]
pub struct TestVector {
    /// Unique identifier for the test.
    pub id: String,
    /// YAML input text.
    pub input: String,
    /// Canonicalizer options.
    #[serde(default)]
    pub options: VectorOptions,
    /// Expected result (success or error).
    pub expected: Expected,
}

/// Result of running a single test vector.
#[derive(Debug)]
pub enum TestResult {
    /// Test passed.
    Pass,
    /// Test failed with mismatch.
    Fail {
        /// Expected result from the corpus.
        expected: String,
        /// Actual result.
        actual: String,
        /// First differing byte when both sides produced output.
        first_diff: Option<usize>,
    },
    /// The vector itself is malformed.
    Error {
        /// Error message.
        message: String,
    },
}

impl TestResult {
    /// Returns true if this is a passing result.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns true if this is a failing result.
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

/// Results from running the corpus.
#[derive(Debug, Default)]
pub struct CorpusResults {
    /// Number of tests that passed.
    pub passed: usize,
    /// Number of tests that failed.
    pub failed: usize,
    /// Number of tests that errored.
    pub errors: usize,
    /// Detailed results for each test.
    pub details: Vec<(String, TestResult)>,
}

impl CorpusResults {
    /// Create a new empty results container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a test result.
    pub fn record(&mut self, id: &str, result: TestResult) {
        match &result {
            TestResult::Pass => self.passed += 1,
            TestResult::Fail { .. } => self.failed += 1,
            TestResult::Error { .. } => self.errors += 1,
        }
        self.details.push((id.to_string(), result));
    }

    /// Get total number of tests run.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errors
    }

    /// Returns true if all tests passed (no failures or errors).
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Get a summary string of the results.
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} errors (total: {})",
            self.passed,
            self.failed,
            self.errors,
            self.total()
        )
    }

    /// Get failures only.
    pub fn failures(&self) -> Vec<&(String, TestResult)> {
        self.details.iter().filter(|(_, r)| r.is_fail()).collect()
    }

    /// Get errors only.
    pub fn error_details(&self) -> Vec<&(String, TestResult)> {
        self.details
            .iter()
            .filter(|(_, r)| matches!(r, TestResult::Error { .. }))
            .collect()
    }
}

/// Corpus runner that executes test vectors.
pub struct CorpusRunner {
    corpus: Corpus,
}

impl CorpusRunner {
    /// Load corpus from a file path.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not a valid corpus.
    pub fn load<P: AsRef<Path>>(path: P) -> ConformanceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConformanceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse a corpus from JSON text.
    ///
    /// # Errors
    ///
    /// If the text is not a valid corpus.
    pub fn from_json(content: &str) -> ConformanceResult<Self> {
        let corpus: Corpus = serde_json::from_str(content)?;
        Ok(Self { corpus })
    }

    /// Get the corpus manifest.
    pub fn manifest(&self) -> &CorpusManifest {
        &self.corpus.manifest
    }

    /// Get the number of test vectors.
    pub fn vector_count(&self) -> usize {
        self.corpus.vectors.len()
    }

    /// Run all test vectors and return results.
    pub fn run_all(&self) -> CorpusResults {
        let mut results = CorpusResults::new();
        for vector in &self.corpus.vectors {
            results.record(&vector.id, run_vector(vector));
        }
        results
    }
}

/// Run a single test vector.
pub fn run_vector(vector: &TestVector) -> TestResult {
    if let Expected::Err(name) = &vector.expected {
        if ErrorKind::from_name(name).is_none() {
            return TestResult::Error {
                message: format!("unknown error kind: {}", name),
            };
        }
    }

    let actual = vector
        .options
        .to_options()
        .and_then(|options| canonicalize(vector.input.as_bytes(), &options));

    match (&vector.expected, actual) {
        (Expected::Ok(expected), Ok(bytes)) => {
            if expected.as_bytes() == bytes.as_slice() {
                TestResult::Pass
            } else {
                TestResult::Fail {
                    expected: expected.clone(),
                    actual: String::from_utf8_lossy(&bytes).into_owned(),
                    first_diff: first_difference(expected.as_bytes(), &bytes),
                }
            }
        }
        (Expected::Ok(expected), Err(e)) => TestResult::Fail {
            expected: expected.clone(),
            actual: format!("{}: {}", e.kind(), e),
            first_diff: None,
        },
        (Expected::Err(name), Ok(bytes)) => TestResult::Fail {
            expected: name.clone(),
            actual: format!("ok: {}", String::from_utf8_lossy(&bytes)),
            first_diff: None,
        },
        (Expected::Err(name), Err(e)) => {
            if e.kind().name() == name {
                TestResult::Pass
            } else {
                TestResult::Fail {
                    expected: name.clone(),
                    actual: format!("{}: {}", e.kind(), e),
                    first_diff: None,
                }
            }
        }
    }
}

/// Index of the first differing byte, or the shorter length when one is a
/// prefix of the other.
pub fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = r#"{
        "manifest": { "format_version": "1" },
        "vectors": [
            { "id": "sort", "input": "b: 1\na: 2\n", "expected": { "ok": "a: 2\nb: 1\n" } },
            { "id": "empty", "input": "", "expected": { "err": "EmptyInputError" } },
            { "id": "check", "input": "b: 1\na: 2\n",
              "options": { "check_ordered": true }, "expected": { "err": "NotSortedError" } },
            { "id": "wrong", "input": "a: 1\n", "expected": { "ok": "a: 2\n" } },
            { "id": "bad-kind", "input": "a: 1\n", "expected": { "err": "NopeError" } }
        ]
    }"#;

    #[test]
    fn test_run_corpus() {
        let runner = CorpusRunner::from_json(CORPUS).unwrap();
        assert_eq!(runner.vector_count(), 5);
        assert_eq!(runner.manifest().format_version, "1");

        let results = runner.run_all();
        assert_eq!(results.passed, 3);
        assert_eq!(results.failed, 1);
        assert_eq!(results.errors, 1);
        assert!(!results.all_passed());

        let (id, result) = results.failures()[0];
        assert_eq!(id, "wrong");
        assert!(matches!(
            result,
            TestResult::Fail {
                first_diff: Some(3),
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_schema_vector() {
        let vector = TestVector {
            id: "schema".into(),
            input: "a: 1\n".into(),
            options: VectorOptions {
                schema: Some("not_a_real_schema".into()),
                ..VectorOptions::default()
            },
            expected: Expected::Err("InvalidSchemaError".into()),
        };
        assert!(run_vector(&vector).is_pass());
    }

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(b"abc", b"abc"), None);
        assert_eq!(first_difference(b"abc", b"abd"), Some(2));
        assert_eq!(first_difference(b"ab", b"abc"), Some(2));
    }

    #[test]
    fn test_malformed_corpus() {
        assert!(matches!(
            CorpusRunner::from_json("{\"vectors\": []}"),
            Err(ConformanceError::Json(_))
        ));
    }
}
