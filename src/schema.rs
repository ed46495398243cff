//! YAML schemas and the tags each one recognizes.
//!
//! Schemas form a strict hierarchy; every schema understands all tags of the
//! schemas below it:
//!
//! ```text
//! failsafe ⊂ json ⊂ core ⊂ default_safe ⊂ default_full
//! ```
//!
//! The same schema drives both loading and dumping, so a document survives
//! parse, dump, parse with its types intact.

use std::fmt;
use std::str::FromStr;

use crate::error::{SortError, SortResult};

/// A named, fixed set of type-resolution rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Schema {
    /// Mappings, sequences and strings only.
    Failsafe,
    /// Adds JSON-compatible null, boolean, integer and float literals.
    Json,
    /// Adds the YAML conveniences (`~`, `True`, `0x1F`, `1_000`, `.inf`, ...).
    Core,
    /// Adds timestamps, merge keys, binary, omap, pairs and set.
    DefaultSafe,
    /// Adds `js/undefined`, `js/regexp` and `js/function`.
    DefaultFull,
}

impl Schema {
    /// All schemas, weakest first.
    pub const ALL: [Schema; 5] = [
        Schema::Failsafe,
        Schema::Json,
        Schema::Core,
        Schema::DefaultSafe,
        Schema::DefaultFull,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Schema::Failsafe => "failsafe_schema",
            Schema::Json => "json_schema",
            Schema::Core => "core_schema",
            Schema::DefaultSafe => "default_safe_schema",
            Schema::DefaultFull => "default_full_schema",
        }
    }

    /// Resolve a schema name, ignoring ASCII case.
    pub fn from_name(name: &str) -> SortResult<Schema> {
        Schema::ALL
            .into_iter()
            .find(|schema| schema.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| SortError::InvalidSchema {
                name: name.to_string(),
            })
    }

    /// Schema used when none is named explicitly.
    pub fn for_safety(safe: bool) -> Schema {
        if safe {
            Schema::DefaultSafe
        } else {
            Schema::DefaultFull
        }
    }

    /// True when `self` contains every rule of `other`.
    pub fn includes(self, other: Schema) -> bool {
        self >= other
    }

    /// Whether `tag` may appear in a document loaded under this schema.
    pub fn supports(self, tag: Tag) -> bool {
        self.includes(tag.schema())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Schema {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schema::from_name(s)
    }
}

/// Prefix shared by all standard tags.
pub const YAML_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Every tag known to some schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `!!str`
    Str,
    /// `!!seq`
    Seq,
    /// `!!map`
    Map,
    /// `!!null`
    Null,
    /// `!!bool`
    Bool,
    /// `!!int`
    Int,
    /// `!!float`
    Float,
    /// `!!timestamp`
    Timestamp,
    /// `!!merge`
    Merge,
    /// `!!binary`
    Binary,
    /// `!!omap`
    Omap,
    /// `!!pairs`
    Pairs,
    /// `!!set`
    Set,
    /// `!!js/undefined`
    JsUndefined,
    /// `!!js/regexp`
    JsRegExp,
    /// `!!js/function`
    JsFunction,
}

impl Tag {
    /// Look up a tag by the part after `tag:yaml.org,2002:`.
    pub fn from_suffix(suffix: &str) -> Option<Tag> {
        let tag = match suffix {
            "str" => Tag::Str,
            "seq" => Tag::Seq,
            "map" => Tag::Map,
            "null" => Tag::Null,
            "bool" => Tag::Bool,
            "int" => Tag::Int,
            "float" => Tag::Float,
            "timestamp" => Tag::Timestamp,
            "merge" => Tag::Merge,
            "binary" => Tag::Binary,
            "omap" => Tag::Omap,
            "pairs" => Tag::Pairs,
            "set" => Tag::Set,
            "js/undefined" => Tag::JsUndefined,
            "js/regexp" => Tag::JsRegExp,
            "js/function" => Tag::JsFunction,
            _ => return None,
        };
        Some(tag)
    }

    /// The part after `tag:yaml.org,2002:`.
    pub fn suffix(self) -> &'static str {
        match self {
            Tag::Str => "str",
            Tag::Seq => "seq",
            Tag::Map => "map",
            Tag::Null => "null",
            Tag::Bool => "bool",
            Tag::Int => "int",
            Tag::Float => "float",
            Tag::Timestamp => "timestamp",
            Tag::Merge => "merge",
            Tag::Binary => "binary",
            Tag::Omap => "omap",
            Tag::Pairs => "pairs",
            Tag::Set => "set",
            Tag::JsUndefined => "js/undefined",
            Tag::JsRegExp => "js/regexp",
            Tag::JsFunction => "js/function",
        }
    }

    /// Weakest schema that knows this tag.
    pub fn schema(self) -> Schema {
        match self {
            Tag::Str | Tag::Seq | Tag::Map => Schema::Failsafe,
            Tag::Null | Tag::Bool | Tag::Int | Tag::Float => Schema::Json,
            Tag::Timestamp
            | Tag::Merge
            | Tag::Binary
            | Tag::Omap
            | Tag::Pairs
            | Tag::Set => Schema::DefaultSafe,
            Tag::JsUndefined | Tag::JsRegExp | Tag::JsFunction => Schema::DefaultFull,
        }
    }

    /// Node kind the tag applies to.
    pub fn kind(self) -> NodeKind {
        match self {
            Tag::Seq | Tag::Omap | Tag::Pairs => NodeKind::Sequence,
            Tag::Map | Tag::Set => NodeKind::Mapping,
            _ => NodeKind::Scalar,
        }
    }

    /// Shorthand form used when dumping (`!!set`, `!<tag:yaml.org,2002:js/regexp>`).
    pub fn shorthand(self) -> String {
        if self.suffix().contains('/') {
            format!("!<{}{}>", YAML_TAG_PREFIX, self.suffix())
        } else {
            format!("!!{}", self.suffix())
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!<{}{}>", YAML_TAG_PREFIX, self.suffix())
    }
}

/// The three YAML node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Single value
    Scalar,
    /// Ordered list
    Sequence,
    /// Key/value collection
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        })
    }
}
