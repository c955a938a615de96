use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::coerce::IdMatch;
use crate::error::CoreError;
use crate::hex24::TemplateId;
use crate::jsonc;
use crate::store::{SlotGroup, SlotRef, TemplateStore};

use super::{PatchEngine, PatchReport};

/// Every filter that accepts `source` also accepts each of `clones`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateMapping {
    pub source: TemplateId,
    pub clones: Vec<TemplateId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateMappings(pub Vec<PlateMapping>);

impl PlateMappings {
    /// Normalizes raw config text: malformed ids, duplicate clones and
    /// mappings left without clones are dropped.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let config: RawConfig = jsonc::from_str(raw)?;
        let mut mappings = Vec::new();

        for raw_mapping in config.mappings.into_iter().flatten().flatten() {
            let Some(source) = raw_mapping
                .source_plate_tpl
                .as_deref()
                .and_then(|s| TemplateId::parse(s).ok())
            else {
                warn!(source = ?raw_mapping.source_plate_tpl, "dropping plate mapping with invalid source");
                continue;
            };

            let mut clones: Vec<TemplateId> = Vec::new();
            for raw_clone in raw_mapping.clone_plate_tpls.into_iter().flatten().flatten() {
                match TemplateId::parse(&raw_clone) {
                    Ok(clone) if clone != source && !clones.contains(&clone) => clones.push(clone),
                    Ok(_) => {}
                    Err(_) => warn!(clone = %raw_clone, "dropping invalid clone plate id"),
                }
            }

            if clones.is_empty() {
                continue;
            }
            mappings.push(PlateMapping { source, clones });
        }

        Ok(Self(mappings))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    #[serde(alias = "Mappings")]
    mappings: Option<Vec<Option<RawMapping>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMapping {
    #[serde(rename = "sourcePlateTpl", alias = "SourcePlateTpl", alias = "sourceplatetpl")]
    source_plate_tpl: Option<String>,
    #[serde(rename = "clonePlateTpls", alias = "ClonePlateTpls", alias = "cloneplatetpls")]
    clone_plate_tpls: Option<Vec<Option<String>>>,
}

/// Lets cloned armor plates fit wherever their source plate fits, across
/// every template in the database.
#[derive(Debug, Clone)]
pub struct BallisticPlateCompat {
    config_path: PathBuf,
}

impl BallisticPlateCompat {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl PatchEngine for BallisticPlateCompat {
    const NAME: &'static str = "ballistic-plate-compat";

    type Config = PlateMappings;

    fn load_config(&self) -> Result<Option<PlateMappings>, CoreError> {
        if !self.config_path.is_file() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.config_path)
            .map_err(|e| CoreError::io(&self.config_path, e))?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let mappings = PlateMappings::parse(&raw)?;
        Ok((!mappings.is_empty()).then_some(mappings))
    }

    fn apply(
        &self,
        mappings: &PlateMappings,
        store: &mut dyn TemplateStore,
    ) -> Result<PatchReport, CoreError> {
        let mut report = PatchReport::default();

        for template in store.template_ids() {
            report.templates_scanned += 1;
            let slot_count = store.slot_names(&template, SlotGroup::Slots).len();
            let mut template_touched = false;

            for index in 0..slot_count {
                let slot = SlotRef::new(&template, SlotGroup::Slots, index);
                let added = patch_slot(store, slot, mappings);
                if added > 0 {
                    report.slots_patched += 1;
                    report.ids_added += added;
                    template_touched = true;
                }
            }

            if template_touched {
                report.templates_patched += 1;
            }
        }

        Ok(report)
    }
}

fn patch_slot(store: &mut dyn TemplateStore, slot: SlotRef<'_>, mappings: &PlateMappings) -> usize {
    let mut added = 0;
    for index in 0..store.filter_count(slot) {
        let filter = slot.filter(index);
        for mapping in &mappings.0 {
            let Some(ids) = store.filter_ids(filter) else {
                break;
            };
            if !ids
                .iter()
                .any(|id| IdMatch::Hex24.matches(id, mapping.source.as_str()))
            {
                continue;
            }
            for clone in &mapping.clones {
                if store.add_filter_id(filter, clone.as_str(), IdMatch::Hex24) {
                    added += 1;
                }
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::PlateMappings;

    #[test]
    fn parse_normalizes_and_drops_bad_entries() {
        let raw = r#"{
            // comments are fine
            "Mappings": [
                { "SourcePlateTpl": "656FAE5F7C2D57AFE200C0D7", "clonePlateTpls": [
                    "6946ebb44e3088ef0bb4dfbe", "6946EBB44E3088EF0BB4DFBE", "bad", null,
                    "656fae5f7c2d57afe200c0d7",
                ] },
                { "sourcePlateTpl": "short", "clonePlateTpls": ["6946ebbacf8f3b61ff54d3eb"] },
                { "sourcePlateTpl": "6946ebbacf8f3b61ff54d3eb", "clonePlateTpls": [] },
                null,
            ],
        }"#;
        let mappings = PlateMappings::parse(raw).expect("config should parse");
        assert_eq!(mappings.0.len(), 1);
        assert_eq!(mappings.0[0].source.as_str(), "656fae5f7c2d57afe200c0d7");
        let clones: Vec<&str> = mappings.0[0].clones.iter().map(|c| c.as_str()).collect();
        assert_eq!(clones, vec!["6946ebb44e3088ef0bb4dfbe"]);
    }

    #[test]
    fn missing_mappings_key_is_empty() {
        assert!(PlateMappings::parse("{}").expect("empty config").is_empty());
    }
}
