//! Canonicalizer configuration.
//!
//! Options are resolved once and shared read-only. Per-file values are set
//! on a copy via [`Options::for_file`].

use std::path::Path;

use crate::error::SortResult;
use crate::schema::Schema;
use crate::yaml::Limits;

/// Line width used when none (or zero) is configured. Large enough that
/// folding never happens in practice.
pub const DEFAULT_LINE_WIDTH: usize = 100_000;

/// Name shown in diagnostics when the input has no file name.
pub const ANONYMOUS_INPUT: &str = "<input>";

/// Settings for one canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Reject constructs that build native types (`!!js/*`)
    pub safe: bool,
    /// Explicit schema; overrides `safe` when set
    pub schema: Option<Schema>,
    /// File name for diagnostics; pinned names survive [`Options::for_file`]
    pub filename: Option<String>,
    /// Folding width for long strings; 0 selects [`DEFAULT_LINE_WIDTH`]
    pub line_width: usize,
    /// Verify key order instead of rewriting
    pub check_ordered: bool,
    /// Resource limits for the loader
    pub limits: Limits,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            safe: true,
            schema: None,
            filename: None,
            line_width: DEFAULT_LINE_WIDTH,
            check_ordered: false,
            limits: Limits::default(),
        }
    }
}

impl Options {
    /// Options in check mode.
    pub fn check() -> Self {
        Self {
            check_ordered: true,
            ..Self::default()
        }
    }

    /// The schema in effect.
    pub fn schema(&self) -> Schema {
        self.schema.unwrap_or_else(|| Schema::for_safety(self.safe))
    }

    /// Line width with the zero default applied.
    pub fn effective_line_width(&self) -> usize {
        if self.line_width == 0 {
            DEFAULT_LINE_WIDTH
        } else {
            self.line_width
        }
    }

    /// Filename for messages.
    pub fn display_filename(&self) -> &str {
        self.filename.as_deref().unwrap_or(ANONYMOUS_INPUT)
    }

    /// Select a schema by name.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` if the name matches no schema.
    pub fn with_schema_name(mut self, name: &str) -> SortResult<Self> {
        self.schema = Some(Schema::from_name(name)?);
        Ok(self)
    }

    /// Select a schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set `safe`.
    pub fn with_safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    /// Pin a filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the line width.
    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    /// Enable or disable check mode.
    pub fn with_check_ordered(mut self, check: bool) -> Self {
        self.check_ordered = check;
        self
    }

    /// Set the loader limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Copy for one file. The path becomes the filename unless one is pinned.
    pub fn for_file(&self, path: &Path) -> Self {
        let mut options = self.clone();
        if options.filename.is_none() {
            options.filename = Some(path.display().to_string());
        }
        options
    }
}
