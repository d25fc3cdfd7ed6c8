//! Value normalization
//!
//! Converts one attribute file's raw key/value tree into a [`Record`]:
//! pointer markers are dereferenced, split paths joined, list-like keys
//! coerced to lists, strings cleaned up and extension blocks keyed by kind.
//!
//! The normalizer is permissive. Shapes it does not recognize are passed
//! through as-is; only unreadable files and invalid JSON are errors.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::value::{classify, Shape};
use crate::Result;

/// Name of the reserved extension list
pub const EXTENSIONS_KEY: &str = "extensions";

/// Discriminator keys naming an extension block's kind
const EXTENSION_DISCRIMINATORS: &[&str] = &["exts", "squadexts"];

/// Key pattern for list coercion
#[derive(Debug, Clone, Copy)]
pub enum KeyPattern {
    Suffix(&'static str),
    Exact(&'static str),
}

impl KeyPattern {
    fn matches(self, key: &str) -> bool {
        match self {
            KeyPattern::Suffix(suffix) => key.ends_with(suffix),
            KeyPattern::Exact(exact) => key == exact,
        }
    }
}

/// Keys always normalized to lists, even when a single value was stored
pub const LIST_KEYS: &[KeyPattern] = &[
    KeyPattern::Suffix("_list"),
    KeyPattern::Suffix("_types"),
    KeyPattern::Suffix("_upgrades"),
    KeyPattern::Suffix("_items"),
    KeyPattern::Suffix("_table"),
    KeyPattern::Suffix("_menus"),
    KeyPattern::Exact(EXTENSIONS_KEY),
    KeyPattern::Exact("abilities"),
    KeyPattern::Exact("requirements"),
    KeyPattern::Exact("hardpoints"),
    KeyPattern::Exact("weapons"),
];

/// Whether a key is coerced to a list
pub fn is_list_key(key: &str) -> bool {
    LIST_KEYS.iter().any(|p| p.matches(key))
}

// ============================================================================
// Record
// ============================================================================

/// Canonical decoding of one attribute file
#[derive(Debug, Clone, Default, Serialize)]
pub struct Record {
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Extension blocks keyed by kind (`combat`, `cost`, `ability`, ...)
    pub extensions: BTreeMap<String, Value>,
}

impl Record {
    /// Build a record from an already-parsed raw tree
    ///
    /// Extension blocks of a kind already seen are merged into the first one.
    pub fn from_raw(path: impl Into<PathBuf>, raw: &Value) -> Self {
        let path = path.into();
        let mut fields = match normalize_value(raw) {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                if !other.is_null() {
                    map.insert("value".to_string(), other);
                }
                map
            }
        };

        let mut extensions = BTreeMap::new();
        if let Some(Value::Array(blocks)) = fields.remove(EXTENSIONS_KEY) {
            let mut unclassified = Vec::new();
            for block in blocks {
                match extension_kind(&block) {
                    Some(kind) => match extensions.get_mut(&kind) {
                        Some(first) => {
                            warn!(
                                path = %path.display(),
                                kind = %kind,
                                "repeated extension block"
                            );
                            merge_block(first, block);
                        }
                        None => {
                            extensions.insert(kind, block);
                        }
                    },
                    None => unclassified.push(block),
                }
            }
            if !unclassified.is_empty() {
                fields.insert(EXTENSIONS_KEY.to_string(), Value::Array(unclassified));
            }
        }

        Record {
            path,
            fields,
            extensions,
        }
    }

    /// Look up a dotted field path (`ui.screen_name`)
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let (head, rest) = match dotted.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (dotted, None),
        };
        let value = self.fields.get(head)?;
        match rest {
            Some(rest) => lookup(value, rest),
            None => Some(value),
        }
    }

    /// Look up a dotted field path and return it as text
    pub fn text(&self, dotted: &str) -> Option<&str> {
        self.get(dotted)?.as_str()
    }

    /// Get an extension block by kind
    pub fn extension(&self, kind: &str) -> Option<&Value> {
        self.extensions.get(kind)
    }
}

/// Walk a dotted path through nested objects
pub fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// Collect every text value stored under `key`, at any depth, in order
pub fn collect_texts<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                match v {
                    Value::String(s) if k == key => out.push(s),
                    Value::Array(items) if k == key => {
                        out.extend(items.iter().filter_map(Value::as_str));
                        for item in items.iter().filter(|i| !i.is_string()) {
                            collect_texts(item, key, out);
                        }
                    }
                    _ => collect_texts(v, key, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_texts(item, key, out);
            }
        }
        _ => {}
    }
}

/// Kind of an extension block: final discriminator segment without `_ext`
fn extension_kind(block: &Value) -> Option<String> {
    let obj = block.as_object()?;
    let declared = EXTENSION_DISCRIMINATORS
        .iter()
        .find_map(|key| obj.get(*key)?.as_str())?;
    let last = declared.rsplit('/').next().unwrap_or(declared);
    let kind = last.strip_suffix("_ext").unwrap_or(last);
    (!kind.is_empty()).then(|| kind.to_string())
}

/// Fold a repeated extension block into the first block of its kind
///
/// Lists are concatenated; differing single values become a list.
fn merge_block(first: &mut Value, block: Value) {
    let (Value::Object(into), Value::Object(from)) = (first, block) else {
        return;
    };

    for (key, value) in from {
        if EXTENSION_DISCRIMINATORS.contains(&key.as_str()) {
            continue;
        }
        match into.get_mut(&key) {
            None => {
                into.insert(key, value);
            }
            Some(Value::Array(items)) => match value {
                Value::Array(more) => items.extend(more),
                other => items.push(other),
            },
            Some(current) if *current == value => {}
            Some(current) => {
                let existing = current.take();
                *current = Value::Array(vec![existing, value]);
            }
        }
    }
}

// ============================================================================
// Value rules
// ============================================================================

/// Normalize a raw value
pub fn normalize_value(raw: &Value) -> Value {
    match classify(raw) {
        Shape::Reference(target) => normalize_value(target),
        Shape::PbgPath { map, name } => join_pbg(map, name),
        Shape::Entries(list) => normalize_entries(&list),
        Shape::Text(text) => normalize_text(text),
        Shape::Scalar(value) | Shape::Opaque(value) => value.clone(),
    }
}

/// Normalize a value stored under a list-coerced key
pub fn normalize_list(raw: &Value) -> Value {
    let items = match classify(raw) {
        Shape::Entries(list) => {
            let first = list[0].0;
            if list.iter().all(|(key, _)| *key == first) {
                list.iter().map(|(_, v)| normalize_value(v)).collect()
            } else {
                // Distinct keys: one flattened element
                vec![normalize_entries(&list)]
            }
        }
        Shape::Opaque(Value::Array(items)) => items.iter().map(normalize_value).collect(),
        _ => match normalize_value(raw) {
            Value::Null => Vec::new(),
            other => vec![other],
        },
    };
    Value::Array(items)
}

fn normalize_entries(list: &[(&str, &Value)]) -> Value {
    let mut map = Map::new();
    let mut repeated: HashSet<&str> = HashSet::new();

    for &(key, raw) in list {
        let coerced = is_list_key(key);
        let value = if coerced {
            normalize_list(raw)
        } else {
            normalize_value(raw)
        };

        let Some(existing) = map.get_mut(key) else {
            map.insert(key.to_string(), value);
            continue;
        };

        match (coerced, existing, value) {
            (true, Value::Array(items), Value::Array(more)) => items.extend(more),
            (_, existing, value) => {
                if repeated.insert(key) {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                } else if let Value::Array(items) = existing {
                    items.push(value);
                }
            }
        }
    }

    Value::Object(map)
}

fn join_pbg(map: Option<&Value>, name: Option<&Value>) -> Value {
    let part = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(|s| s.replace('\\', "/").trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
    };
    match (part(map), part(name)) {
        (Some(map), Some(name)) => Value::String(format!("{}/{}", map, name)),
        _ => Value::Null,
    }
}

fn normalize_text(text: &str) -> Value {
    if text.is_empty() {
        Value::Null
    } else {
        Value::String(text.replace('\\', "/"))
    }
}

// ============================================================================
// Normalizer
// ============================================================================

/// Caching normalizer keyed by physical path
#[derive(Debug, Default)]
pub struct Normalizer {
    cache: HashMap<PathBuf, Arc<Record>>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and normalize a file, reusing the cached record if present
    pub fn normalize(&mut self, path: &Path) -> Result<Arc<Record>> {
        if let Some(record) = self.cache.get(path) {
            return Ok(Arc::clone(record));
        }

        let content = fs::read_to_string(path)?;
        let raw: Value = serde_json::from_str(&content)?;
        let record = Arc::new(Record::from_raw(path, &raw));

        self.cache.insert(path.to_path_buf(), Arc::clone(&record));
        Ok(record)
    }

    /// Number of cached records
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
