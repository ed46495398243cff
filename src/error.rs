//! Error handling for the YAML canonicalizer.
//!
//! Every failure is local to one document: callers processing a batch report
//! the error for that unit and carry on with the rest.
//!
//! The taxonomy is fixed:
//!
//! - `EmptyInputError` - zero-length input, never handed to the parser
//! - `ParseError` - malformed YAML or a construct the schema does not allow
//! - `NotSortedError` - check mode found keys out of canonical order
//! - `InvalidSchemaError` - unknown schema name, raised at configuration time
//!
//! `IoError` exists only for the file driver.

use std::fmt;

use thiserror::Error;

/// Result type used throughout the crate.
pub type SortResult<T> = Result<T, SortError>;

/// Position inside the input text (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Line number
    pub line: usize,
    /// Column number
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Discriminant of a [`SortError`], stable for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Zero-length input
    EmptyInput,
    /// Malformed or disallowed YAML
    Parse,
    /// Keys are not in canonical order
    NotSorted,
    /// Unknown schema name
    InvalidSchema,
    /// Reading or writing a file failed
    Io,
}

impl ErrorKind {
    /// Name used in reports and in the conformance corpus.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "EmptyInputError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::NotSorted => "NotSortedError",
            ErrorKind::InvalidSchema => "InvalidSchemaError",
            ErrorKind::Io => "IoError",
        }
    }

    /// Inverse of [`ErrorKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "EmptyInputError" => Some(ErrorKind::EmptyInput),
            "ParseError" => Some(ErrorKind::Parse),
            "NotSortedError" => Some(ErrorKind::NotSorted),
            "InvalidSchemaError" => Some(ErrorKind::InvalidSchema),
            "IoError" => Some(ErrorKind::Io),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors produced while canonicalizing a document.
#[derive(Debug, Error)]
pub enum SortError {
    /// The input buffer had zero length.
    #[error("File {filename} is empty. YAML loader cannot load empty content")]
    EmptyInput {
        /// File the input came from
        filename: String,
    },

    /// The input is not valid YAML for the selected schema.
    #[error("{filename}: {message}{}", fmt_location(.location))]
    Parse {
        /// File the input came from
        filename: String,
        /// Parser diagnostic
        message: String,
        /// Where the parser stopped, when known
        location: Option<Location>,
    },

    /// Check mode: the document's key order differs from canonical order.
    #[error("File: {filename} must be processed")]
    NotSorted {
        /// File the input came from
        filename: String,
    },

    /// A schema name did not match any known schema.
    #[error("Schema {name} is not valid")]
    InvalidSchema {
        /// The rejected name
        name: String,
    },

    /// The driver could not read or write a file.
    #[error("{filename}: {source}")]
    Io {
        /// File being processed
        filename: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

fn fmt_location(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" at {}", loc),
        None => String::new(),
    }
}

impl SortError {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SortError::EmptyInput { .. } => ErrorKind::EmptyInput,
            SortError::Parse { .. } => ErrorKind::Parse,
            SortError::NotSorted { .. } => ErrorKind::NotSorted,
            SortError::InvalidSchema { .. } => ErrorKind::InvalidSchema,
            SortError::Io { .. } => ErrorKind::Io,
        }
    }

    /// File the error refers to. Schema errors happen before any file is read.
    pub fn filename(&self) -> Option<&str> {
        match self {
            SortError::EmptyInput { filename }
            | SortError::Parse { filename, .. }
            | SortError::NotSorted { filename }
            | SortError::Io { filename, .. } => Some(filename),
            SortError::InvalidSchema { .. } => None,
        }
    }

    /// Parser location, for parse errors that have one.
    pub fn location(&self) -> Option<Location> {
        match self {
            SortError::Parse { location, .. } => *location,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            ErrorKind::EmptyInput,
            ErrorKind::Parse,
            ErrorKind::NotSorted,
            ErrorKind::InvalidSchema,
            ErrorKind::Io,
        ] {
            assert_eq!(ErrorKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ErrorKind::from_name("Bogus"), None);
    }

    #[test]
    fn test_messages() {
        let err = SortError::EmptyInput {
            filename: "a.yml".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "File a.yml is empty. YAML loader cannot load empty content"
        );

        let err = SortError::NotSorted {
            filename: "a.yml".to_string(),
        };
        assert_eq!(err.to_string(), "File: a.yml must be processed");

        let err = SortError::InvalidSchema {
            name: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "Schema nope is not valid");
        assert_eq!(err.filename(), None);
    }

    #[test]
    fn test_parse_error_location() {
        let err = SortError::Parse {
            filename: "a.yml".to_string(),
            message: "duplicated mapping key".to_string(),
            location: Some(Location { line: 3, column: 1 }),
        };
        assert_eq!(
            err.to_string(),
            "a.yml: duplicated mapping key at line 3, column 1"
        );
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.location(), Some(Location { line: 3, column: 1 }));
    }
}
