use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::jsonc;

use super::AssortDocument;
use super::repair::{RepairReport, repair};

pub const DEFAULT_FOLDERS: &[&str] = &[
    "AssortAmmo",
    "AssortArmor",
    "AssortAttachments",
    "AssortItems",
    "AssortWeapons",
    "data",
];

/// A keyed assort section (`barter_scheme` or `loyal_level_items`) that
/// remembers every fragment that wrote each key.
#[derive(Debug, Clone, Default)]
pub(super) struct KeyedSection {
    pub(super) entries: Vec<(String, Vec<(usize, Value)>)>,
    index: HashMap<String, usize>,
}

impl KeyedSection {
    fn insert(&mut self, key: &str, fragment: usize, value: Value) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1.push((fragment, value)),
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), vec![(fragment, value)]));
            }
        }
    }

    pub(super) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulated fragments, each item tagged with the fragment it came from.
#[derive(Debug, Clone, Default)]
pub struct FragmentSet {
    pub(super) fragments: usize,
    pub(super) items: Vec<(usize, Value)>,
    pub(super) barter_scheme: KeyedSection,
    pub(super) loyal_level_items: KeyedSection,
}

impl FragmentSet {
    /// Adds `root` if it looks like an assort fragment (has `items`,
    /// `barter_scheme` or `loyal_level_items`). Returns whether it did.
    pub fn push_value(&mut self, root: &Value) -> bool {
        let Some(object) = root.as_object() else {
            return false;
        };
        let is_fragment = ["items", "barter_scheme", "loyal_level_items"]
            .iter()
            .any(|key| object.contains_key(*key));
        if !is_fragment {
            return false;
        }

        let fragment = self.fragments;
        self.fragments += 1;

        if let Some(items) = object.get("items").and_then(Value::as_array) {
            self.items
                .extend(items.iter().map(|item| (fragment, item.clone())));
        }
        if let Some(barter) = object.get("barter_scheme").and_then(Value::as_object) {
            for (key, value) in barter {
                self.barter_scheme.insert(key, fragment, value.clone());
            }
        }
        if let Some(loyal) = object.get("loyal_level_items").and_then(Value::as_object) {
            for (key, value) in loyal {
                self.loyal_level_items.insert(key, fragment, value.clone());
            }
        }
        true
    }

    pub fn push_document(&mut self, document: AssortDocument) {
        let fragment = self.fragments;
        self.fragments += 1;
        self.items
            .extend(document.items.into_iter().map(|item| (fragment, item)));
        for (key, value) in document.barter_scheme {
            self.barter_scheme.insert(&key, fragment, value);
        }
        for (key, value) in document.loyal_level_items {
            self.loyal_level_items.insert(&key, fragment, value);
        }
    }

    /// Moves every fragment of `other` after this set's own fragments.
    pub fn append(&mut self, other: FragmentSet) {
        let offset = self.fragments;
        self.fragments += other.fragments;
        self.items
            .extend(other.items.into_iter().map(|(f, item)| (f + offset, item)));
        for (key, writers) in other.barter_scheme.entries {
            for (f, value) in writers {
                self.barter_scheme.insert(&key, f + offset, value);
            }
        }
        for (key, writers) in other.loyal_level_items.entries {
            for (f, value) in writers {
                self.loyal_level_items.insert(&key, f + offset, value);
            }
        }
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.barter_scheme.is_empty() && self.loyal_level_items.is_empty()
    }

    /// Merges everything into one document and repairs its identifiers.
    pub fn into_document<R: Rng + ?Sized>(self, rng: &mut R) -> (AssortDocument, RepairReport) {
        repair(self, rng)
    }
}

/// Walks a trader folder's assort subfolders and merges every fragment.
#[derive(Debug, Clone)]
pub struct AssortMerger {
    folders: Vec<String>,
}

impl Default for AssortMerger {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDERS.iter().map(|f| (*f).to_string()))
    }
}

impl AssortMerger {
    pub fn new(folders: impl IntoIterator<Item = String>) -> Self {
        Self {
            folders: folders.into_iter().collect(),
        }
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    /// Reads every fragment under the configured subfolders of `trader_dir`.
    /// Files that fail to parse are logged and left out.
    pub fn collect(&self, trader_dir: &Path) -> FragmentSet {
        let mut set = FragmentSet::default();
        for folder in &self.folders {
            let root = trader_dir.join(folder);
            if !root.is_dir() {
                continue;
            }
            for path in json_files_sorted(&root) {
                match jsonc::read_file(&path) {
                    Ok(value) => {
                        if !set.push_value(&value) {
                            debug!(path = %path.display(), "not an assort fragment, skipping");
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable assort fragment");
                    }
                }
            }
        }
        set
    }

    pub fn merge(&self, trader_dir: &Path) -> AssortDocument {
        self.merge_with_rng(trader_dir, &mut rand::thread_rng())
    }

    pub fn merge_with_rng<R: Rng + ?Sized>(
        &self,
        trader_dir: &Path,
        rng: &mut R,
    ) -> AssortDocument {
        let set = self.collect(trader_dir);
        let fragments = set.fragment_count();
        let (document, report) = set.into_document(rng);
        info!(
            trader_dir = %trader_dir.display(),
            fragments,
            items = document.items.len(),
            minted = report.minted,
            "assort merged"
        );
        document
    }

    /// Like [`merge`](Self::merge) with `base` as the first fragment. `base`
    /// comes back untouched when no fragment contributed anything.
    pub fn merge_with_base(
        &self,
        base: Option<AssortDocument>,
        trader_dir: &Path,
    ) -> AssortDocument {
        let collected = self.collect(trader_dir);
        let Some(base) = base else {
            return collected.into_document(&mut rand::thread_rng()).0;
        };
        if collected.is_empty() {
            return base;
        }
        let mut set = FragmentSet::default();
        set.push_document(base);
        set.append(collected);
        set.into_document(&mut rand::thread_rng()).0
    }
}

fn json_files_sorted(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    paths
}
