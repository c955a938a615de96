#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use armory_core::assort::AssortDocument;
use armory_core::store::{JsonItemTable, TemplateStore};
use armory_trader::{Host, QUEST_ASSORT_GROUPS, TraderBase};
use serde_json::{Map, Value};

#[derive(Debug, Default)]
pub struct RegisteredTrader {
    pub base: TraderBase,
    pub assort: AssortDocument,
    pub quest_assort: BTreeMap<String, Map<String, Value>>,
}

/// In-memory stand-in for the game server.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub routes: Vec<(String, PathBuf)>,
    pub traders: BTreeMap<String, RegisteredTrader>,
    pub refresh: BTreeMap<String, (u32, u32)>,
    pub flea: Vec<String>,
    pub locale: BTreeMap<String, String>,
    pub table: JsonItemTable,
}

impl FakeHost {
    pub fn with_items(items: Value) -> Self {
        Self {
            table: JsonItemTable::from_value(items).expect("items must be an object"),
            ..Self::default()
        }
    }

    pub fn route(&self, key: &str) -> Option<&Path> {
        self.routes
            .iter()
            .find(|(route, _)| route == key)
            .map(|(_, file)| file.as_path())
    }
}

impl Host for FakeHost {
    fn add_image_route(&mut self, route: &str, file: &Path) {
        self.routes.push((route.to_string(), file.to_path_buf()));
    }

    fn add_trader(&mut self, base: &TraderBase) -> bool {
        if self.traders.contains_key(&base.id) {
            return false;
        }
        let quest_assort = QUEST_ASSORT_GROUPS
            .iter()
            .map(|group| (group.to_string(), Map::new()))
            .collect();
        self.traders.insert(
            base.id.clone(),
            RegisteredTrader {
                base: base.clone(),
                assort: AssortDocument::default(),
                quest_assort,
            },
        );
        true
    }

    fn set_refresh_window(&mut self, trader_id: &str, min_secs: u32, max_secs: u32) {
        self.refresh.insert(trader_id.to_string(), (min_secs, max_secs));
    }

    fn enable_on_flea(&mut self, trader_id: &str) {
        self.flea.push(trader_id.to_string());
    }

    fn add_locale_entries(&mut self, entries: &[(String, String)]) {
        for (key, text) in entries {
            self.locale.insert(key.clone(), text.clone());
        }
    }

    fn overwrite_assort(&mut self, trader_id: &str, assort: AssortDocument) -> bool {
        match self.traders.get_mut(trader_id) {
            Some(trader) => {
                trader.assort = assort;
                true
            }
            None => false,
        }
    }

    fn templates(&mut self) -> &mut dyn TemplateStore {
        &mut self.table
    }
}

pub fn write(path: &Path, text: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, text).expect("write fixture");
}
