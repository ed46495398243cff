//! Block-style YAML emitter.
//!
//! Produces the canonical text of a [`YamlValue`]: two-space indentation,
//! block collections, compact nested sequences, and mapping keys sorted by
//! UTF-16 code unit order of their text when `sort_keys` is set. With
//! `sort_keys` off the same rules apply but keys keep their source order,
//! which is what check mode compares against.
//!
//! Scalars are written plain whenever the plain form loads back as the same
//! value under the active schema, single-quoted otherwise. Multi-line
//! strings use literal blocks, single-line strings longer than the line
//! width are folded, and anything with non-printable characters is
//! double-quoted.

use std::cmp::Ordering;

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};

use super::resolve::plain_is_string;
use super::types::YamlValue;
use crate::options::DEFAULT_LINE_WIDTH;
use crate::schema::{NodeKind, Schema, Tag};

/// Keys longer than this are written as explicit `? key` entries.
const MAX_SIMPLE_KEY_LENGTH: usize = 1024;

/// Emitter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    /// Schema whose implicit types decide which strings need quotes
    pub schema: Schema,
    /// Sort mapping and set keys
    pub sort_keys: bool,
    /// Column budget before long strings are folded
    pub line_width: usize,
}

impl DumpOptions {
    /// Sorted output under `schema` with the default line width.
    pub fn sorted(schema: Schema) -> Self {
        Self {
            schema,
            sort_keys: true,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

/// Compare two keys using UTF-16 code unit ordering.
///
/// This is the ordering of JavaScript's default `Array.prototype.sort`,
/// which differs from `str::cmp` for characters outside the BMP.
pub fn compare_keys_utf16(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Serialize a document to YAML text ending in a newline.
pub fn dump(value: &YamlValue, options: &DumpOptions) -> String {
    let mut dumper = Dumper {
        options,
        out: String::new(),
    };
    dumper.write_document(value);
    dumper.out
}

/// Text of a float that resolves back to a float.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        ".nan".to_string()
    } else if value == f64::INFINITY {
        ".inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-.inf".to_string()
    } else {
        // Debug keeps a fraction or exponent ("1.0", "1e21")
        format!("{:?}", value)
    }
}

/// Text of a timestamp that resolves back to the same instant.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Where a scalar is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// The whole document is this scalar
    Document,
    /// Value of a block mapping entry or a block sequence item
    Block,
    /// Implicit key of a block mapping
    Key,
    /// Inside a flow collection
    Flow,
}

/// A scalar ready to be written.
enum Rendered {
    /// Fits on the current line
    Inline(String),
    /// Block scalar: header on the current line, content lines below
    Block { header: String, lines: Vec<String> },
}

impl Rendered {
    fn with_tag(self, tag: &str) -> Rendered {
        match self {
            Rendered::Inline(text) => Rendered::Inline(format!("{} {}", tag, text)),
            Rendered::Block { header, lines } => Rendered::Block {
                header: format!("{} {}", tag, header),
                lines,
            },
        }
    }

    fn inline(self) -> Option<String> {
        match self {
            Rendered::Inline(text) => Some(text),
            Rendered::Block { .. } => None,
        }
    }
}

struct Dumper<'a> {
    options: &'a DumpOptions,
    out: String,
}

impl Dumper<'_> {
    fn write_document(&mut self, value: &YamlValue) {
        match value {
            _ if is_empty_collection(value) => {
                let text = self.flow(value);
                self.out.push_str(&text);
                self.out.push('\n');
            }
            _ if value.kind() != NodeKind::Scalar => {
                if let Some(tag) = value.explicit_tag() {
                    self.out.push_str("--- ");
                    self.out.push_str(&tag.shorthand());
                    self.out.push('\n');
                }
                self.write_collection(value, 0, false);
            }
            _ => {
                let rendered = self.scalar(value, Context::Document, 2);
                self.emit(rendered, 2);
                self.out.push('\n');
            }
        }
    }

    /// Write a non-empty collection in block style. When `inline_first` is
    /// set the cursor already sits where the first entry starts.
    fn write_collection(&mut self, value: &YamlValue, indent: usize, inline_first: bool) {
        match value {
            YamlValue::Mapping(entries) => {
                for (i, (key, item)) in self.ordered_entries(entries).into_iter().enumerate() {
                    if i > 0 || !inline_first {
                        self.write_indent(indent);
                    }
                    self.write_entry(key, item, indent);
                }
            }
            YamlValue::Set(keys) => {
                for (i, key) in self.ordered_keys(keys).into_iter().enumerate() {
                    if i > 0 || !inline_first {
                        self.write_indent(indent);
                    }
                    self.write_entry(key, &YamlValue::Null, indent);
                }
            }
            YamlValue::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 || !inline_first {
                        self.write_indent(indent);
                    }
                    self.out.push('-');
                    self.write_item(item, indent);
                }
            }
            YamlValue::Omap(pairs) | YamlValue::Pairs(pairs) => {
                for (i, (key, item)) in pairs.iter().enumerate() {
                    if i > 0 || !inline_first {
                        self.write_indent(indent);
                    }
                    self.out.push_str("- ");
                    self.write_entry(key, item, indent + 2);
                }
            }
            _ => {}
        }
    }

    /// `key: value` at the cursor, ending with a newline.
    fn write_entry(&mut self, key: &YamlValue, value: &YamlValue, indent: usize) {
        let simple = if key.kind() == NodeKind::Scalar {
            self.scalar(key, Context::Key, indent + 2)
                .inline()
                .filter(|text| text.chars().count() <= MAX_SIMPLE_KEY_LENGTH)
        } else {
            None
        };

        match simple {
            Some(text) => {
                self.out.push_str(&text);
                self.out.push(':');
            }
            None => {
                let text = self.flow(key);
                self.out.push_str("? ");
                self.out.push_str(&text);
                self.out.push('\n');
                self.write_indent(indent);
                self.out.push(':');
            }
        }
        self.write_value(value, indent);
    }

    /// Value after `key:`; the cursor sits right after the colon.
    fn write_value(&mut self, value: &YamlValue, indent: usize) {
        if is_empty_collection(value) {
            let text = self.flow(value);
            self.out.push(' ');
            self.out.push_str(&text);
            self.out.push('\n');
        } else if value.kind() != NodeKind::Scalar {
            if let Some(tag) = value.explicit_tag() {
                self.out.push(' ');
                self.out.push_str(&tag.shorthand());
            }
            self.out.push('\n');
            self.write_collection(value, indent + 2, false);
        } else {
            self.out.push(' ');
            let rendered = self.scalar(value, Context::Block, indent + 2);
            self.emit(rendered, indent + 2);
            self.out.push('\n');
        }
    }

    /// Sequence item after `-`; the cursor sits right after the dash.
    fn write_item(&mut self, item: &YamlValue, indent: usize) {
        if is_empty_collection(item) {
            let text = self.flow(item);
            self.out.push(' ');
            self.out.push_str(&text);
            self.out.push('\n');
        } else if item.kind() != NodeKind::Scalar {
            match item.explicit_tag() {
                Some(tag) => {
                    self.out.push(' ');
                    self.out.push_str(&tag.shorthand());
                    self.out.push('\n');
                    self.write_collection(item, indent + 2, false);
                }
                None => {
                    self.out.push(' ');
                    self.write_collection(item, indent + 2, true);
                }
            }
        } else {
            self.out.push(' ');
            let rendered = self.scalar(item, Context::Block, indent + 2);
            self.emit(rendered, indent + 2);
            self.out.push('\n');
        }
    }

    fn write_indent(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }

    fn emit(&mut self, rendered: Rendered, indent: usize) {
        match rendered {
            Rendered::Inline(text) => self.out.push_str(&text),
            Rendered::Block { header, lines } => {
                self.out.push_str(&header);
                for line in lines {
                    self.out.push('\n');
                    if !line.is_empty() {
                        self.write_indent(indent);
                        self.out.push_str(&line);
                    }
                }
            }
        }
    }

    fn ordered_entries<'v>(
        &self,
        entries: &'v [(YamlValue, YamlValue)],
    ) -> Vec<(&'v YamlValue, &'v YamlValue)> {
        let pairs = entries.iter().map(|(k, v)| (k, v));
        if !self.options.sort_keys {
            return pairs.collect();
        }
        let mut keyed: Vec<(String, (&YamlValue, &YamlValue))> =
            pairs.map(|pair| (self.sort_text(pair.0), pair)).collect();
        // sort_by is stable: keys with equal text keep source order
        keyed.sort_by(|a, b| compare_keys_utf16(&a.0, &b.0));
        keyed.into_iter().map(|(_, pair)| pair).collect()
    }

    fn ordered_keys<'v>(&self, keys: &'v [YamlValue]) -> Vec<&'v YamlValue> {
        if !self.options.sort_keys {
            return keys.iter().collect();
        }
        let mut keyed: Vec<(String, &YamlValue)> =
            keys.iter().map(|key| (self.sort_text(key), key)).collect();
        keyed.sort_by(|a, b| compare_keys_utf16(&a.0, &b.0));
        keyed.into_iter().map(|(_, key)| key).collect()
    }

    /// The string a key is sorted by: its unquoted scalar text, or the flow
    /// form of a collection key.
    fn sort_text(&self, key: &YamlValue) -> String {
        match key {
            YamlValue::Null => "null".to_string(),
            YamlValue::Bool(b) => b.to_string(),
            YamlValue::Int(n) => n.to_string(),
            YamlValue::Float(f) => format_float(*f),
            YamlValue::String(s) | YamlValue::RegExp(s) | YamlValue::Function(s) => s.clone(),
            YamlValue::Timestamp(ts) => format_timestamp(ts),
            YamlValue::Binary(bytes) => encode_binary(bytes),
            YamlValue::Undefined => "undefined".to_string(),
            _ => self.flow(key),
        }
    }

    fn scalar(&self, value: &YamlValue, context: Context, indent: usize) -> Rendered {
        match value {
            YamlValue::Null => Rendered::Inline("null".to_string()),
            YamlValue::Bool(b) => Rendered::Inline(b.to_string()),
            YamlValue::Int(n) => Rendered::Inline(n.to_string()),
            YamlValue::Float(f) => Rendered::Inline(format_float(*f)),
            YamlValue::Timestamp(ts) => Rendered::Inline(format_timestamp(ts)),
            YamlValue::String(s) => self.string(s, context, indent),
            YamlValue::Binary(bytes) => self
                .string(&encode_binary(bytes), context, indent)
                .with_tag(&Tag::Binary.shorthand()),
            YamlValue::Undefined => Rendered::Inline(format!(
                "{} ''",
                Tag::JsUndefined.shorthand()
            )),
            YamlValue::RegExp(s) => self
                .string(s, context, indent)
                .with_tag(&Tag::JsRegExp.shorthand()),
            YamlValue::Function(s) => self
                .string(s, context, indent)
                .with_tag(&Tag::JsFunction.shorthand()),
            // Collections never reach here
            _ => Rendered::Inline(self.flow(value)),
        }
    }

    fn string(&self, s: &str, context: Context, indent: usize) -> Rendered {
        if s.is_empty() {
            return Rendered::Inline("''".to_string());
        }
        if needs_double_quotes(s) {
            return Rendered::Inline(double_quote(s));
        }

        let block_allowed = matches!(context, Context::Document | Context::Block);

        if s.contains('\n') {
            let indicator = needs_indent_indicator(s);
            let literal_ok = block_allowed
                && s.chars().any(|c| !c.is_whitespace())
                && !(indicator && context == Context::Document);
            return if literal_ok {
                literal(s, indicator)
            } else {
                Rendered::Inline(double_quote(s))
            };
        }

        let width = self.width(indent);
        if block_allowed && s.chars().count() > width && is_foldable(s) {
            return Rendered::Block {
                header: ">-".to_string(),
                lines: fold(s, width).into_iter().map(str::to_string).collect(),
            };
        }

        if is_plain_safe(s, context == Context::Flow) && plain_is_string(s, self.options.schema) {
            Rendered::Inline(s.to_string())
        } else {
            Rendered::Inline(single_quote(s))
        }
    }

    fn width(&self, indent: usize) -> usize {
        let line_width = self.options.line_width;
        line_width.min(40).max(line_width.saturating_sub(indent))
    }

    /// Single-line flow form, used for complex keys and empty collections.
    fn flow(&self, value: &YamlValue) -> String {
        let body = match value {
            YamlValue::Sequence(items) => {
                let items: Vec<String> = items.iter().map(|item| self.flow(item)).collect();
                format!("[{}]", items.join(", "))
            }
            YamlValue::Omap(pairs) | YamlValue::Pairs(pairs) => {
                let items: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{{{}: {}}}", self.flow(k), self.flow(v)))
                    .collect();
                format!("[{}]", items.join(", "))
            }
            YamlValue::Mapping(entries) => {
                let items: Vec<String> = self
                    .ordered_entries(entries)
                    .into_iter()
                    .map(|(k, v)| format!("{}: {}", self.flow(k), self.flow(v)))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            YamlValue::Set(keys) => {
                let items: Vec<String> = self
                    .ordered_keys(keys)
                    .into_iter()
                    .map(|k| format!("{}: null", self.flow(k)))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            scalar => {
                return self
                    .scalar(scalar, Context::Flow, 0)
                    .inline()
                    .unwrap_or_default();
            }
        };
        match value.explicit_tag() {
            Some(tag) => format!("{} {}", tag.shorthand(), body),
            None => body,
        }
    }
}

fn is_empty_collection(value: &YamlValue) -> bool {
    match value {
        YamlValue::Sequence(items) | YamlValue::Set(items) => items.is_empty(),
        YamlValue::Mapping(entries) | YamlValue::Omap(entries) | YamlValue::Pairs(entries) => {
            entries.is_empty()
        }
        _ => false,
    }
}

fn encode_binary(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// YAML's printable character set (c-printable).
fn is_printable(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\u{20}'..='\u{7E}' | '\u{85}'
        | '\u{A0}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn needs_double_quotes(s: &str) -> bool {
    s.chars().any(|c| {
        !is_printable(c) || matches!(c, '\r' | '\u{85}' | '\u{FEFF}' | '\u{2028}' | '\u{2029}')
    })
}

fn is_plain_safe(s: &str, flow: bool) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if matches!(
        first,
        '-' | '?' | ':' | ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\''
            | '"' | '%' | '@' | '`' | ' '
    ) {
        return false;
    }
    if s.ends_with(' ') || s.ends_with(':') || s.starts_with("...") {
        return false;
    }
    if s.contains(": ") || s.contains(" #") {
        return false;
    }
    if s.chars().any(|c| c == '\n' || c == '\t') {
        return false;
    }
    if flow && s.chars().any(|c| matches!(c, ',' | '[' | ']' | '{' | '}' | ':')) {
        return false;
    }
    true
}

fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn double_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\x0B' => out.push_str("\\v"),
            '\x0C' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\x1B' => out.push_str("\\e"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if !is_printable(c) || c == '\u{FEFF}' => {
                let code = c as u32;
                if code <= 0xFF {
                    out.push_str(&format!("\\x{:02X}", code));
                } else if code <= 0xFFFF {
                    out.push_str(&format!("\\u{:04X}", code));
                } else {
                    out.push_str(&format!("\\U{:08X}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Leading spaces on the first content line would be taken as indentation.
fn needs_indent_indicator(s: &str) -> bool {
    s.trim_start_matches('\n').starts_with(' ')
}

fn literal(s: &str, indicator: bool) -> Rendered {
    let body = s.trim_end_matches('\n');
    let trailing = s.len() - body.len();
    let chomp = match trailing {
        0 => "-",
        1 => "",
        _ => "+",
    };
    let mut lines: Vec<String> = body.split('\n').map(str::to_string).collect();
    lines.extend(std::iter::repeat(String::new()).take(trailing.saturating_sub(1)));
    Rendered::Block {
        header: format!("|{}{}", if indicator { "2" } else { "" }, chomp),
        lines,
    }
}

/// A single space with non-space characters on both sides.
fn is_break(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b' '
        && i > 0
        && bytes[i - 1] != b' '
        && bytes.get(i + 1).is_some_and(|next| *next != b' ')
}

fn is_foldable(s: &str) -> bool {
    let bytes = s.as_bytes();
    !s.starts_with(' ')
        && !s.ends_with(' ')
        && !s.contains(['\t', '\n'])
        && (0..bytes.len()).any(|i| is_break(bytes, i))
}

/// Greedy word wrap at single spaces. Each break replaces exactly one space,
/// which is what a folded block scalar turns back into a space.
fn fold(s: &str, width: usize) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut candidate: Option<usize> = None;

    for i in 0..bytes.len() {
        if !is_break(bytes, i) {
            continue;
        }
        if s[start..i].chars().count() > width {
            let at = candidate.filter(|c| *c > start).unwrap_or(i);
            lines.push(&s[start..at]);
            start = at + 1;
            candidate = (at != i).then_some(i);
        } else {
            candidate = Some(i);
        }
    }
    if s[start..].chars().count() > width {
        if let Some(at) = candidate.filter(|c| *c > start) {
            lines.push(&s[start..at]);
            start = at + 1;
        }
    }
    lines.push(&s[start..]);
    lines
}
