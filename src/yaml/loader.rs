//! Event-stream loader.
//!
//! Drives `saphyr-parser` and folds its events into a [`YamlValue`] tree,
//! resolving tags and plain scalars against the active [`Schema`].
//!
//! Beyond syntax, the loader rejects:
//!
//! - tags the schema does not know (this is what keeps `js/function` out of
//!   safe loads)
//! - duplicate mapping keys
//! - aliases to anchors that were never defined
//! - streams holding zero or several documents
//! - documents that break the [`Limits`]

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use saphyr_parser::{Event, Parser, ScanError, Span, TScalarStyle};

use super::limits::Limits;
use super::resolve::{is_merge_key, resolve_plain, resolve_tagged};
use super::types::{Mapping, YamlValue};
use crate::error::Location;
use crate::schema::{NodeKind, Schema, Tag, YAML_TAG_PREFIX};

/// Why a document could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// Human-readable diagnostic
    pub message: String,
    /// Position of the offending node, when known
    pub location: Option<Location>,
}

impl LoadError {
    fn new(message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{} at {}", self.message, loc),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<ScanError> for LoadError {
    fn from(err: ScanError) -> Self {
        let marker = err.marker();
        LoadError::new(
            err.info().to_string(),
            Some(Location {
                line: marker.line(),
                column: marker.col() + 1,
            }),
        )
    }
}

/// Load a single YAML document under `schema`.
pub fn load(text: &str, schema: Schema, limits: &Limits) -> Result<YamlValue, LoadError> {
    if !limits.allows_input(text.len()) {
        return Err(LoadError::new(
            format!(
                "input of {} bytes exceeds the limit of {} bytes",
                text.len(),
                limits.max_input_size
            ),
            None,
        ));
    }

    let mut loader = Loader::new(schema, *limits);
    for item in Parser::new_from_str(text) {
        let (event, span) = item?;
        loader.on_event(event, span)?;
    }
    loader.finish()
}

/// How a node's tag was written.
enum TagRef {
    /// No tag
    Absent,
    /// The non-specific `!` tag
    NonSpecific,
    /// A tag the crate knows
    Known(Tag),
    /// Anything else, kept verbatim for the error message
    Unknown(String),
}

fn classify_tag(handle: &str, suffix: &str) -> TagRef {
    let full = if handle == "!!" {
        format!("{}{}", YAML_TAG_PREFIX, suffix)
    } else {
        format!("{}{}", handle, suffix)
    };
    if full.is_empty() || full == "!" {
        return TagRef::NonSpecific;
    }
    match full.strip_prefix(YAML_TAG_PREFIX).and_then(Tag::from_suffix) {
        Some(tag) => TagRef::Known(tag),
        None => TagRef::Unknown(full),
    }
}

/// A mapping under construction.
#[derive(Default)]
struct MappingBuilder {
    entries: Mapping,
    /// Entries copied in by a merge key; explicit keys may replace them.
    overridable: Vec<bool>,
    /// Key hash to the positions of entries with that hash.
    index: HashMap<u64, Vec<usize>>,
    /// Key waiting for its value, and whether it is a merge key.
    pending_key: Option<(YamlValue, bool)>,
}

impl MappingBuilder {
    fn add(&mut self, node: YamlValue, merge: bool) -> Result<(), String> {
        match self.pending_key.take() {
            None => {
                self.pending_key = Some((node, merge));
                Ok(())
            }
            Some((_, true)) => self.merge(node),
            Some((key, false)) => self.insert(key, node),
        }
    }

    fn find(&self, key: &YamlValue) -> Option<usize> {
        self.index
            .get(&key_hash(key))?
            .iter()
            .copied()
            .find(|&i| self.entries[i].0 == *key)
    }

    fn push(&mut self, key: YamlValue, value: YamlValue, overridable: bool) {
        self.index
            .entry(key_hash(&key))
            .or_default()
            .push(self.entries.len());
        self.entries.push((key, value));
        self.overridable.push(overridable);
    }

    fn insert(&mut self, key: YamlValue, value: YamlValue) -> Result<(), String> {
        match self.find(&key) {
            Some(index) if self.overridable[index] => {
                self.entries[index].1 = value;
                self.overridable[index] = false;
                Ok(())
            }
            Some(_) => Err("duplicated mapping key".to_string()),
            None => {
                self.push(key, value, false);
                Ok(())
            }
        }
    }

    /// `<<: *base` or `<<: [*a, *b]`; earlier sources win.
    fn merge(&mut self, source: YamlValue) -> Result<(), String> {
        match source {
            YamlValue::Mapping(entries) => {
                self.merge_entries(entries);
                Ok(())
            }
            YamlValue::Sequence(items) => {
                for item in items {
                    match item {
                        YamlValue::Mapping(entries) => self.merge_entries(entries),
                        _ => return Err(merge_error()),
                    }
                }
                Ok(())
            }
            _ => Err(merge_error()),
        }
    }

    fn merge_entries(&mut self, entries: Mapping) {
        for (key, value) in entries {
            if self.find(&key).is_none() {
                self.push(key, value, true);
            }
        }
    }
}

fn key_hash(key: &YamlValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

fn merge_error() -> String {
    "cannot merge mappings; the provided source object is unacceptable".to_string()
}

enum FrameBody {
    Sequence(Vec<YamlValue>),
    Mapping(MappingBuilder),
}

struct Frame {
    anchor: usize,
    tag: Option<Tag>,
    start: Location,
    body: FrameBody,
}

struct Loader {
    schema: Schema,
    limits: Limits,
    stack: Vec<Frame>,
    anchors: HashMap<usize, YamlValue>,
    nodes: u64,
    root: Option<YamlValue>,
}

impl Loader {
    fn new(schema: Schema, limits: Limits) -> Self {
        Self {
            schema,
            limits,
            stack: Vec::new(),
            anchors: HashMap::new(),
            nodes: 0,
            root: None,
        }
    }

    fn on_event(&mut self, event: Event, span: Span) -> Result<(), LoadError> {
        let location = Location {
            line: span.start.line(),
            column: span.start.col() + 1,
        };
        let at = |message: String| LoadError::new(message, Some(location));

        match event {
            Event::Scalar(value, style, anchor, tag) => {
                let value = String::from(value);
                let tag = match tag {
                    Some(tag) => classify_tag(&tag.handle, &tag.suffix),
                    None => TagRef::Absent,
                };
                let plain = matches!(style, TScalarStyle::Plain);
                let (node, merge) = self.resolve_scalar(&value, plain, tag).map_err(at)?;
                self.charge(1, location)?;
                self.complete(node, anchor, merge, location)
            }
            Event::SequenceStart(anchor, tag) => {
                let tag = tag.map(|t| classify_tag(&t.handle, &t.suffix));
                let tag = self.collection_tag(tag, NodeKind::Sequence).map_err(at)?;
                self.open(anchor, tag, location, FrameBody::Sequence(Vec::new()))
            }
            Event::MappingStart(anchor, tag) => {
                let tag = tag.map(|t| classify_tag(&t.handle, &t.suffix));
                let tag = self.collection_tag(tag, NodeKind::Mapping).map_err(at)?;
                self.open(anchor, tag, location, FrameBody::Mapping(MappingBuilder::default()))
            }
            Event::SequenceEnd | Event::MappingEnd => self.close(),
            Event::Alias(id) => {
                let node = self
                    .anchors
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| at("unidentified alias".to_string()))?;
                self.charge(node.node_count(), location)?;
                self.complete(node, 0, false, location)
            }
            _ => Ok(()),
        }
    }

    fn resolve_scalar(
        &self,
        value: &str,
        plain: bool,
        tag: TagRef,
    ) -> Result<(YamlValue, bool), String> {
        match tag {
            TagRef::Absent if plain => {
                if is_merge_key(value, self.schema) {
                    Ok((YamlValue::String(value.to_string()), true))
                } else {
                    Ok((resolve_plain(value, self.schema), false))
                }
            }
            TagRef::Absent | TagRef::NonSpecific => {
                Ok((YamlValue::String(value.to_string()), false))
            }
            TagRef::Known(tag) if self.schema.supports(tag) => {
                let node = resolve_tagged(tag, value, self.schema)?;
                Ok((node, tag == Tag::Merge))
            }
            TagRef::Known(tag) => Err(format!("unknown tag {}", tag)),
            TagRef::Unknown(name) => Err(format!("unknown tag !<{}>", name)),
        }
    }

    fn collection_tag(&self, tag: Option<TagRef>, kind: NodeKind) -> Result<Option<Tag>, String> {
        match tag {
            None | Some(TagRef::Absent) | Some(TagRef::NonSpecific) => Ok(None),
            Some(TagRef::Known(tag)) if !self.schema.supports(tag) => {
                Err(format!("unknown tag {}", tag))
            }
            Some(TagRef::Known(tag)) if tag.kind() != kind => Err(format!(
                "unacceptable node kind for {} tag; it should be \"{}\", not \"{}\"",
                tag,
                tag.kind(),
                kind
            )),
            Some(TagRef::Known(tag)) => Ok(Some(tag)),
            Some(TagRef::Unknown(name)) => Err(format!("unknown tag !<{}>", name)),
        }
    }

    fn open(
        &mut self,
        anchor: usize,
        tag: Option<Tag>,
        start: Location,
        body: FrameBody,
    ) -> Result<(), LoadError> {
        if self.stack.len() as u64 >= self.limits.max_nesting_depth {
            return Err(LoadError::new(
                format!(
                    "nesting depth exceeds the limit of {}",
                    self.limits.max_nesting_depth
                ),
                Some(start),
            ));
        }
        self.stack.push(Frame {
            anchor,
            tag,
            start,
            body,
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), LoadError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| LoadError::new("unbalanced collection end", None))?;
        let at = |message: String| LoadError::new(message, Some(frame.start));

        let node = match frame.body {
            FrameBody::Sequence(items) => build_sequence(frame.tag, items).map_err(at)?,
            FrameBody::Mapping(mut builder) => {
                if let Some((key, _)) = builder.pending_key.take() {
                    builder.insert(key, YamlValue::Null).map_err(at)?;
                }
                build_mapping(frame.tag, builder.entries).map_err(at)?
            }
        };
        self.charge(1, frame.start)?;
        self.complete(node, frame.anchor, false, frame.start)
    }

    fn charge(&mut self, nodes: u64, location: Location) -> Result<(), LoadError> {
        self.nodes = self.nodes.saturating_add(nodes);
        if self.nodes > self.limits.max_nodes {
            return Err(LoadError::new(
                format!(
                    "document exceeds the limit of {} nodes",
                    self.limits.max_nodes
                ),
                Some(location),
            ));
        }
        Ok(())
    }

    /// Hand a finished node to its parent, or make it the document root.
    fn complete(
        &mut self,
        node: YamlValue,
        anchor: usize,
        merge: bool,
        location: Location,
    ) -> Result<(), LoadError> {
        if anchor != 0 {
            self.anchors.insert(anchor, node.clone());
        }

        match self.stack.last_mut() {
            Some(Frame {
                body: FrameBody::Sequence(items),
                ..
            }) => {
                items.push(node);
                Ok(())
            }
            Some(Frame {
                body: FrameBody::Mapping(builder),
                ..
            }) => builder
                .add(node, merge)
                .map_err(|message| LoadError::new(message, Some(location))),
            None if self.root.is_some() => Err(LoadError::new(
                "expected a single document in the stream, but found more",
                Some(location),
            )),
            None => {
                self.root = Some(node);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<YamlValue, LoadError> {
        self.root
            .ok_or_else(|| LoadError::new("stream contains no document", None))
    }
}

fn build_sequence(tag: Option<Tag>, items: Vec<YamlValue>) -> Result<YamlValue, String> {
    match tag {
        Some(tag @ (Tag::Omap | Tag::Pairs)) => {
            let mut pairs = Mapping::with_capacity(items.len());
            for item in items {
                let pair = match item {
                    YamlValue::Mapping(mut entries) if entries.len() == 1 => entries.pop(),
                    _ => None,
                };
                let Some((key, value)) = pair else {
                    return Err(format!("cannot resolve a node with {} explicit tag", tag));
                };
                if tag == Tag::Omap && pairs.iter().any(|(k, _)| *k == key) {
                    return Err(format!("cannot resolve a node with {} explicit tag", tag));
                }
                pairs.push((key, value));
            }
            Ok(if tag == Tag::Omap {
                YamlValue::Omap(pairs)
            } else {
                YamlValue::Pairs(pairs)
            })
        }
        _ => Ok(YamlValue::Sequence(items)),
    }
}

fn build_mapping(tag: Option<Tag>, entries: Mapping) -> Result<YamlValue, String> {
    match tag {
        Some(Tag::Set) => {
            if entries.iter().any(|(_, v)| !v.is_null()) {
                return Err(format!("cannot resolve a node with {} explicit tag", Tag::Set));
            }
            Ok(YamlValue::Set(entries.into_iter().map(|(k, _)| k).collect()))
        }
        _ => Ok(YamlValue::Mapping(entries)),
    }
}
