//! Trader assort assembly: many hand-written JSON fragments in, one
//! loadable catalog out.

mod merge;
mod repair;

pub use merge::{AssortMerger, DEFAULT_FOLDERS, FragmentSet};
pub use repair::RepairReport;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A trader's for-sale catalog. Every section is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssortDocument {
    pub items: Vec<Value>,
    pub barter_scheme: Map<String, Value>,
    pub loyal_level_items: Map<String, Value>,
}

impl AssortDocument {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.barter_scheme.is_empty() && self.loyal_level_items.is_empty()
    }

    /// Identifier of every item, in catalog order.
    pub fn item_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| item.get("_id").and_then(Value::as_str))
            .collect()
    }

    /// Runs the id repair pass over this document as a single fragment.
    pub fn repaired<R: rand::Rng + ?Sized>(self, rng: &mut R) -> (Self, RepairReport) {
        let mut set = FragmentSet::default();
        set.push_document(self);
        set.into_document(rng)
    }
}
