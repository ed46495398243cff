//! YAML loading and canonical dumping.
//!
//! # Architecture
//!
//! - [`types`] - Document tree
//! - [`limits`] - Input size, nesting and alias expansion limits
//! - [`resolve`] - Scalar type resolution per schema
//! - [`loader`] - saphyr-parser event stream to [`YamlValue`]
//! - [`dumper`] - Block emitter with sorted keys
//!
//! # Example
//!
//! ```
//! use yaml_sort::schema::Schema;
//! use yaml_sort::yaml::{dump, load, DumpOptions, Limits};
//!
//! let value = load("b: 1\na: 2\n", Schema::DefaultSafe, &Limits::default()).unwrap();
//! let text = dump(&value, &DumpOptions::sorted(Schema::DefaultSafe));
//! assert_eq!(text, "a: 2\nb: 1\n");
//! ```

pub mod dumper;
pub mod limits;
pub mod loader;
pub mod resolve;
pub mod types;

pub use dumper::{compare_keys_utf16, dump, DumpOptions};
pub use limits::Limits;
pub use loader::{load, LoadError};
pub use types::{Mapping, YamlValue};
