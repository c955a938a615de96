//! Per-weapon slot filter overrides declared next to the armory's item
//! definitions (`Weapons/*.json`, key `salcosCompat`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::coerce::IdMatch;
use crate::error::CoreError;
use crate::hex24::TemplateId;
use crate::jsonc;
use crate::store::{SlotGroup, SlotRef, TemplateStore};

use super::{PatchEngine, PatchReport};

/// What happens to a matched slot's first filter list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMergePolicy {
    /// The override list becomes the whole filter.
    #[default]
    Replace,
    /// Override ids are appended where missing; existing ids stay.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotOverride {
    #[serde(rename = "slotName", alias = "SlotName", default)]
    pub slot_name: Option<String>,
    /// Null entries are allowed and skipped.
    #[serde(rename = "filterTpls", alias = "FilterTpls", default)]
    pub filter_tpls: Option<Vec<Option<String>>>,
    #[serde(rename = "clearExcludedFilter", alias = "ClearExcludedFilter", default)]
    pub clear_excluded_filter: Option<bool>,
}

impl SlotOverride {
    pub fn wanted_slot(&self) -> &str {
        self.slot_name.as_deref().map_or("", str::trim)
    }

    /// Defaults to clearing when the file does not say.
    pub fn clears_excluded(&self) -> bool {
        self.clear_excluded_filter.unwrap_or(true)
    }

    fn usable_tpls(&self) -> Vec<String> {
        self.filter_tpls
            .iter()
            .flatten()
            .flatten()
            .map(|tpl| tpl.trim())
            .filter(|tpl| !tpl.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Overrides keyed by the weapon template they apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaponOverrides(pub BTreeMap<TemplateId, Vec<SlotOverride>>);

impl WeaponOverrides {
    /// Reads every top-level `*.json` in `dir`, in case-insensitive filename
    /// order. A later file replaces an earlier file's entry for the same id.
    pub fn load_dir(dir: &Path) -> Result<Self, CoreError> {
        let entries = fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))?;
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        files.sort_by_key(|path| path.to_string_lossy().to_ascii_lowercase());

        let mut overrides = Self::default();
        for path in files {
            match jsonc::read_file(&path) {
                Ok(document) => overrides.merge_document(&document),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring malformed weapon file");
                }
            }
        }
        Ok(overrides)
    }

    /// Folds one weapon file (`{ "<id>": { "salcosCompat": {...} } }`) in.
    pub fn merge_document(&mut self, document: &Value) {
        let Some(entries) = document.as_object() else {
            return;
        };
        for (key, entry) in entries {
            let Some(compat) = entry
                .get("salcosCompat")
                .or_else(|| entry.get("SalcosCompat"))
            else {
                continue;
            };
            let wrapper: CompatEntry = match serde_json::from_value(compat.clone()) {
                Ok(wrapper) => wrapper,
                Err(e) => {
                    warn!(id = %key, error = %e, "ignoring malformed salcosCompat entry");
                    continue;
                }
            };
            let slot_overrides: Vec<SlotOverride> = wrapper
                .slot_overrides
                .unwrap_or_default()
                .into_iter()
                .filter_map(|raw| match serde_json::from_value(raw) {
                    Ok(slot_override) => Some(slot_override),
                    Err(e) => {
                        warn!(id = %key, error = %e, "ignoring malformed slot override");
                        None
                    }
                })
                .collect();
            if slot_overrides.is_empty() {
                continue;
            }
            let explicit = wrapper
                .id
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|id| TemplateId::parse(id).ok());
            let Some(id) = explicit.or_else(|| TemplateId::parse(key).ok()) else {
                warn!(id = %key, "ignoring salcosCompat entry without a valid id");
                continue;
            };
            self.0.insert(id, slot_overrides);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CompatEntry {
    #[serde(default)]
    id: Option<Value>,
    /// Overrides are decoded one by one so a bad one only drops itself.
    #[serde(rename = "slotOverrides", alias = "SlotOverrides", default)]
    slot_overrides: Option<Vec<Value>>,
}

#[derive(Debug, Clone)]
pub struct SalcosCompat {
    weapons_dir: PathBuf,
    policy: FilterMergePolicy,
}

impl SalcosCompat {
    pub fn new(weapons_dir: impl Into<PathBuf>, policy: FilterMergePolicy) -> Self {
        Self {
            weapons_dir: weapons_dir.into(),
            policy,
        }
    }

    pub fn policy(&self) -> FilterMergePolicy {
        self.policy
    }
}

impl PatchEngine for SalcosCompat {
    const NAME: &'static str = "salcos-compat";

    type Config = WeaponOverrides;

    fn load_config(&self) -> Result<Option<WeaponOverrides>, CoreError> {
        if !self.weapons_dir.is_dir() {
            return Ok(None);
        }
        let overrides = WeaponOverrides::load_dir(&self.weapons_dir)?;
        Ok((!overrides.is_empty()).then_some(overrides))
    }

    fn apply(
        &self,
        overrides: &WeaponOverrides,
        store: &mut dyn TemplateStore,
    ) -> Result<PatchReport, CoreError> {
        let mut report = PatchReport::default();

        for (id, slot_overrides) in &overrides.0 {
            if !store.has_template(id.as_str()) {
                debug!(id = %id, "override target not in database");
                continue;
            }
            report.templates_scanned += 1;

            let mut touched = false;
            for slot_override in slot_overrides {
                let tpls = slot_override.usable_tpls();
                let wanted = slot_override.wanted_slot();
                if wanted.is_empty() || tpls.is_empty() {
                    continue;
                }
                for slot in find_slots(store, id.as_str(), wanted) {
                    if let Some(added) =
                        apply_to_slot(store, slot, &tpls, slot_override, self.policy)
                    {
                        report.slots_patched += 1;
                        report.ids_added += added;
                        touched = true;
                    }
                }
            }
            if touched {
                report.templates_patched += 1;
            }
        }

        Ok(report)
    }
}

/// Exact case-insensitive name match across slots and chambers; failing
/// that, any slot that looks like a magazine or chamber slot when the
/// override asked for one.
fn find_slots<'a>(
    store: &dyn TemplateStore,
    template: &'a str,
    wanted: &str,
) -> Vec<SlotRef<'a>> {
    let candidates: Vec<(SlotRef<'a>, Option<String>)> = [SlotGroup::Slots, SlotGroup::Chambers]
        .into_iter()
        .flat_map(|group| {
            store
                .slot_names(template, group)
                .into_iter()
                .enumerate()
                .map(move |(index, name)| (SlotRef::new(template, group, index), name))
        })
        .collect();

    let exact: Vec<SlotRef<'a>> = candidates
        .iter()
        .filter(|(_, name)| name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(wanted)))
        .map(|(slot, _)| *slot)
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    let wanted = wanted.to_ascii_lowercase();
    let want_chamber = wanted.contains("chamber") || wanted.contains("patron");
    let want_mag = wanted.contains("mag");

    candidates
        .into_iter()
        .filter_map(|(slot, name)| {
            let lower = name?.trim().to_ascii_lowercase();
            if lower.is_empty() {
                return None;
            }
            let is_mag = want_mag && lower.contains("mag");
            let is_chamber =
                want_chamber && (lower.contains("chamber") || lower.contains("patron"));
            (is_mag || is_chamber).then_some(slot)
        })
        .collect()
}

/// Returns how many ids were written to the filter, or `None` if the slot
/// could not be patched.
fn apply_to_slot(
    store: &mut dyn TemplateStore,
    slot: SlotRef<'_>,
    tpls: &[String],
    slot_override: &SlotOverride,
    policy: FilterMergePolicy,
) -> Option<usize> {
    if !store.ensure_filter(slot) {
        return None;
    }
    let filter = slot.filter(0);

    let added = match policy {
        FilterMergePolicy::Replace => {
            if !store.replace_filter_ids(filter, tpls) {
                return None;
            }
            tpls.len()
        }
        FilterMergePolicy::Append => tpls
            .iter()
            .filter(|tpl| store.add_filter_id(filter, tpl, IdMatch::IgnoreCase))
            .count(),
    };

    if slot_override.clears_excluded() {
        store.clear_excluded(filter);
    }
    Some(added)
}
