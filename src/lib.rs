//! yaml-sort - canonical YAML with sorted mapping keys.
//!
//! Parses a YAML document under one of five schemas, then writes it back
//! with every mapping's keys sorted. In check mode it instead verifies that
//! the document's keys are already in canonical order.
//!
//! # Architecture
//!
//! - [`schema`] - The five schemas and their tag tables
//! - [`options`] - Canonicalizer configuration
//! - [`yaml`] - Document tree, loader and emitter
//! - [`canonicalize`](mod@canonicalize) - The parse, sort, dump, check transform
//! - [`driver`] - Files and streams, batch reporting
//! - [`conformance`] - JSON corpus runner
//! - [`error`] - Error taxonomy
//!
//! # Example
//!
//! ```
//! use yaml_sort::{canonicalize, ErrorKind, Options};
//!
//! let out = canonicalize(b"b: 1\na: 2\n", &Options::default()).unwrap();
//! assert_eq!(out, b"a: 2\nb: 1\n");
//!
//! let err = canonicalize(b"b: 1\na: 2\n", &Options::check()).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NotSorted);
//! ```

// Library code must not panic on any input.
// Tests are checked separately with `cargo test`.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod canonicalize;
pub mod conformance;
pub mod driver;
pub mod error;
pub mod options;
pub mod schema;
pub mod yaml;

// Re-export commonly used types
pub use canonicalize::{canonicalize, canonicalize_str, is_sorted};
pub use driver::{BatchReport, Driver, FileStatus, WriteMode};
pub use error::{ErrorKind, Location, SortError, SortResult};
pub use options::Options;
pub use schema::Schema;
pub use yaml::{Limits, YamlValue};
