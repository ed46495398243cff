//! Canonical form of a YAML document.
//!
//! # Example
//!
//! ```
//! use yaml_sort::{canonicalize, Options};
//!
//! let out = canonicalize(b"z:\n  b: 1\n  a: 2\na: 3\n", &Options::default()).unwrap();
//! assert_eq!(out, b"a: 3\nz:\n  a: 2\n  b: 1\n");
//! ```

use tracing::debug;

use crate::error::{SortError, SortResult};
use crate::options::Options;
use crate::yaml::{dump, load, DumpOptions, LoadError, YamlValue};

const BOM: char = '\u{FEFF}';

/// Canonicalize a YAML document.
///
/// Parses `input` under the schema selected by `options` and dumps it with
/// every mapping's keys sorted. In check mode the document is also dumped
/// in source key order, and the call fails with `NotSorted` when the two
/// dumps differ.
///
/// # Errors
///
/// - `EmptyInput` for a zero-length buffer
/// - `Parse` for invalid UTF-8, malformed YAML, or a disallowed tag
/// - `NotSorted` in check mode when key order is not canonical
pub fn canonicalize(input: &[u8], options: &Options) -> SortResult<Vec<u8>> {
    let filename = options.display_filename();
    if input.is_empty() {
        return Err(SortError::EmptyInput {
            filename: filename.to_string(),
        });
    }
    if !options.limits.allows_input(input.len()) {
        return Err(parse_error(
            options,
            LoadError {
                message: format!(
                    "input is {} bytes, limit is {}",
                    input.len(),
                    options.limits.max_input_size
                ),
                location: None,
            },
        ));
    }
    let text = std::str::from_utf8(input).map_err(|e| SortError::Parse {
        filename: filename.to_string(),
        message: format!("input is not valid UTF-8: {}", e),
        location: None,
    })?;

    let output = canonicalize_str(text, options)?;
    Ok(output.into_bytes())
}

/// [`canonicalize`] for text that is already decoded.
///
/// # Errors
///
/// As [`canonicalize`].
pub fn canonicalize_str(text: &str, options: &Options) -> SortResult<String> {
    let filename = options.display_filename();
    if text.is_empty() {
        return Err(SortError::EmptyInput {
            filename: filename.to_string(),
        });
    }
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let schema = options.schema();

    let document = load(text, schema, &options.limits).map_err(|e| parse_error(options, e))?;

    let dump_options = DumpOptions {
        schema,
        sort_keys: true,
        line_width: options.effective_line_width(),
    };
    let sorted = dump(&document, &dump_options);

    debug!(
        filename,
        schema = schema.name(),
        input_bytes = text.len(),
        output_bytes = sorted.len(),
        "canonicalized document"
    );

    if options.check_ordered && !dumps_match(&document, &sorted, &dump_options) {
        return Err(SortError::NotSorted {
            filename: filename.to_string(),
        });
    }
    Ok(sorted)
}

/// Whether `input` is already in canonical key order.
///
/// # Errors
///
/// Any error of [`canonicalize`] other than `NotSorted`.
pub fn is_sorted(input: &[u8], options: &Options) -> SortResult<bool> {
    let options = options.clone().with_check_ordered(true);
    match canonicalize(input, &options) {
        Ok(_) => Ok(true),
        Err(SortError::NotSorted { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Compares the sorted dump with a dump in source key order.
fn dumps_match(document: &YamlValue, sorted: &str, options: &DumpOptions) -> bool {
    let natural = dump(
        document,
        &DumpOptions {
            sort_keys: false,
            ..*options
        },
    );
    natural == sorted
}

fn parse_error(options: &Options, err: LoadError) -> SortError {
    SortError::Parse {
        filename: options.display_filename().to_string(),
        message: err.message,
        location: err.location,
    }
}
