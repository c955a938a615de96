//! Appending template ids to id collections of whatever element type the
//! host happens to use.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

use serde_json::{Value, json};

use crate::accessor;
use crate::hex24::TemplateId;

/// How an existing element is compared against the id being added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdMatch {
    #[default]
    Ordinal,
    IgnoreCase,
    /// Both sides reduced to their embedded 24-hex id first.
    Hex24,
}

impl IdMatch {
    pub fn matches(self, existing: &str, wanted: &str) -> bool {
        match self {
            Self::Ordinal => existing == wanted,
            Self::IgnoreCase => existing.eq_ignore_ascii_case(wanted),
            Self::Hex24 => match (TemplateId::extract(existing), TemplateId::extract(wanted)) {
                (Some(a), Some(b)) => a == b,
                _ => existing.eq_ignore_ascii_case(wanted),
            },
        }
    }
}

/// A collection of template ids with an "add" capability.
pub trait IdCollection {
    /// String form of every element; elements without one are skipped.
    fn ids(&self) -> Vec<Cow<'_, str>>;

    /// Converts `id` to the element type and appends it. Returns `false`
    /// when the conversion is impossible.
    fn insert_id(&mut self, id: &str) -> bool;

    fn contains_id(&self, id: &str, mode: IdMatch) -> bool {
        self.ids().iter().any(|existing| mode.matches(existing, id))
    }
}

/// Appends `id` unless an equal element is already present. Returns whether
/// the collection changed.
pub fn add_if_missing<C: IdCollection + ?Sized>(
    collection: &mut C,
    id: &str,
    mode: IdMatch,
) -> bool {
    if collection.contains_id(id, mode) {
        return false;
    }
    collection.insert_id(id)
}

impl IdCollection for Vec<String> {
    fn ids(&self) -> Vec<Cow<'_, str>> {
        self.iter().map(|s| Cow::Borrowed(s.as_str())).collect()
    }

    fn insert_id(&mut self, id: &str) -> bool {
        self.push(id.to_string());
        true
    }
}

impl IdCollection for BTreeSet<String> {
    fn ids(&self) -> Vec<Cow<'_, str>> {
        self.iter().map(|s| Cow::Borrowed(s.as_str())).collect()
    }

    fn insert_id(&mut self, id: &str) -> bool {
        self.insert(id.to_string())
    }
}

impl IdCollection for Vec<TemplateId> {
    fn ids(&self) -> Vec<Cow<'_, str>> {
        self.iter().map(|id| Cow::Borrowed(id.as_str())).collect()
    }

    fn insert_id(&mut self, id: &str) -> bool {
        match TemplateId::parse(id) {
            Ok(parsed) => {
                self.push(parsed);
                true
            }
            Err(_) => false,
        }
    }
}

impl IdCollection for HashSet<TemplateId> {
    fn ids(&self) -> Vec<Cow<'_, str>> {
        self.iter().map(|id| Cow::Borrowed(id.as_str())).collect()
    }

    fn insert_id(&mut self, id: &str) -> bool {
        TemplateId::parse(id).is_ok_and(|parsed| self.insert(parsed))
    }
}

/// Element representation found in a JSON id array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    Plain,
    /// `{"$oid": "..."}`
    Wrapped,
}

impl ElementShape {
    pub fn of(elements: &[Value]) -> Self {
        match elements.iter().find(|v| !v.is_null()) {
            Some(Value::Object(map)) if map.contains_key("$oid") => Self::Wrapped,
            _ => Self::Plain,
        }
    }

    pub fn build(self, id: &str) -> Value {
        match self {
            Self::Plain => Value::String(id.to_string()),
            Self::Wrapped => json!({ "$oid": id }),
        }
    }
}

impl IdCollection for Vec<Value> {
    fn ids(&self) -> Vec<Cow<'_, str>> {
        self.iter()
            .filter_map(|value| match value {
                Value::Number(n) => Some(Cow::Owned(n.to_string())),
                other => accessor::as_id_str(other).map(Cow::Borrowed),
            })
            .collect()
    }

    fn insert_id(&mut self, id: &str) -> bool {
        let shape = ElementShape::of(self);
        self.push(shape.build(id));
        true
    }
}
