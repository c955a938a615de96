//! Identifier repair for merged assorts.
//!
//! Fragment authors copy-paste ids, so the merged item list can hold
//! missing, malformed, `$oid`-wrapped or colliding `_id`s. Each offending
//! item gets a freshly minted id and every reference to the old one
//! (`parentId`, `barter_scheme` and `loyal_level_items` keys) follows it.
//!
//! References resolve against the item's own fragment first: when two files
//! both use id X, children in the second file follow the second file's
//! renamed X, not the first file's.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde_json::{Map, Value};

use crate::accessor::{self, Member};
use crate::hex24::{TemplateId, is_hex24};

use super::AssortDocument;
use super::merge::{FragmentSet, KeyedSection};

const STRING_FIELDS: &[&str] = &["_tpl", "parentId", "slotId"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Items that received a freshly minted id.
    pub minted: usize,
    pub renamed_parents: usize,
    /// `barter_scheme`/`loyal_level_items` keys written under a new id.
    pub renamed_keys: usize,
}

/// Old id → where it still lives or what it became, per fragment.
#[derive(Debug, Default)]
struct IdMap {
    kept: HashMap<String, usize>,
    renamed: HashMap<String, Vec<(usize, String)>>,
}

impl IdMap {
    fn resolve<'a>(&'a self, fragment: usize, old: &'a str) -> &'a str {
        if self.kept.get(old) == Some(&fragment) {
            return old;
        }
        let renames = self.renamed.get(old);
        if let Some((_, new)) = renames.and_then(|r| r.iter().find(|(f, _)| *f == fragment)) {
            return new;
        }
        if self.kept.contains_key(old) {
            return old;
        }
        renames
            .and_then(|r| r.first())
            .map_or(old, |(_, new)| new.as_str())
    }
}

pub(super) fn repair<R: Rng + ?Sized>(
    set: FragmentSet,
    rng: &mut R,
) -> (AssortDocument, RepairReport) {
    let mut report = RepairReport::default();
    let mut ids = IdMap::default();
    let mut assigned: HashSet<String> = HashSet::new();
    let mut items = set.items;

    for (fragment, item) in &mut items {
        let current = accessor::get(item, Member::Id);
        let plain = current.and_then(Value::as_str);
        let old = current.and_then(accessor::as_id_str).map(str::to_owned);

        let keep =
            plain.filter(|id| is_hex24(id) && !assigned.contains(&id.to_ascii_lowercase()));
        if let Some(id) = keep {
            assigned.insert(id.to_ascii_lowercase());
            ids.kept.insert(id.to_string(), *fragment);
            continue;
        }

        let fresh = mint_unique(rng, &assigned);
        assigned.insert(fresh.clone());
        if let Some(old) = old {
            ids.renamed
                .entry(old)
                .or_default()
                .push((*fragment, fresh.clone()));
        }
        write_item_id(item, fresh);
        report.minted += 1;
    }

    for (fragment, item) in &mut items {
        let Some(parent) = item
            .get("parentId")
            .and_then(accessor::as_id_str)
            .map(str::to_owned)
        else {
            continue;
        };
        let resolved = ids.resolve(*fragment, &parent);
        if resolved != parent {
            let resolved = resolved.to_string();
            item["parentId"] = Value::String(resolved);
            report.renamed_parents += 1;
        }
    }

    let barter_scheme = rewrite_keys(set.barter_scheme, &ids, &mut report);
    let loyal_level_items = rewrite_keys(set.loyal_level_items, &ids, &mut report);

    let items = items
        .into_iter()
        .map(|(_, mut item)| {
            normalize_string_fields(&mut item);
            item
        })
        .collect();

    (
        AssortDocument {
            items,
            barter_scheme,
            loyal_level_items,
        },
        report,
    )
}

fn mint_unique<R: Rng + ?Sized>(rng: &mut R, assigned: &HashSet<String>) -> String {
    loop {
        let id = TemplateId::mint(rng).into_string();
        if !assigned.contains(&id) {
            return id;
        }
    }
}

/// Each writer's key resolves against its own fragment, like `parentId`.
/// Writers landing on the same id: last one wins.
fn rewrite_keys(
    section: KeyedSection,
    ids: &IdMap,
    report: &mut RepairReport,
) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, writers) in section.entries {
        for (fragment, value) in writers {
            let target = ids.resolve(fragment, &key);
            if target != key {
                report.renamed_keys += 1;
            }
            out.insert(target.to_string(), value);
        }
    }
    out
}

/// Minted ids always land in `_id`, replacing whichever alias held the old
/// one in place.
fn write_item_id(item: &mut Value, id: String) {
    let Some(object) = item.as_object_mut() else {
        return;
    };
    let is_id_key = |key: &str| {
        Member::Id
            .aliases()
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(key))
    };
    let mut id = Some(Value::String(id));
    for (key, value) in std::mem::take(object) {
        if !is_id_key(key.as_str()) {
            object.insert(key, value);
        } else if let Some(id) = id.take() {
            object.insert(Member::Id.canonical().to_string(), id);
        }
    }
    if let Some(id) = id {
        object.insert(Member::Id.canonical().to_string(), id);
    }
}

/// `_tpl`, `parentId` and `slotId` must be plain strings for the host.
fn normalize_string_fields(item: &mut Value) {
    let Some(object) = item.as_object_mut() else {
        return;
    };
    for field in STRING_FIELDS {
        let Some(value) = object.get_mut(*field) else {
            continue;
        };
        let token = match &*value {
            Value::String(_) | Value::Null => continue,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => match accessor::as_id_str(other) {
                Some(id) => id.to_string(),
                None => continue,
            },
        };
        *value = Value::String(token);
    }
}
