//! Narrow view of the host's item-template table used by the patch engines.
//!
//! Engines address slots and filters by position rather than holding
//! borrows into host objects, so the trait stays object safe and a host can
//! implement it over whatever storage it owns.

use serde_json::{Map, Value};

use crate::accessor::{self, Member};
use crate::coerce::{ElementShape, IdCollection, IdMatch, add_if_missing};
use crate::hex24::TemplateId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotGroup {
    Slots,
    Chambers,
}

impl SlotGroup {
    fn member(self) -> Member {
        match self {
            Self::Slots => Member::Slots,
            Self::Chambers => Member::Chambers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef<'a> {
    pub template: &'a str,
    pub group: SlotGroup,
    pub index: usize,
}

impl<'a> SlotRef<'a> {
    pub fn new(template: &'a str, group: SlotGroup, index: usize) -> Self {
        Self {
            template,
            group,
            index,
        }
    }

    pub fn filter(self, index: usize) -> FilterRef<'a> {
        FilterRef { slot: self, index }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRef<'a> {
    pub slot: SlotRef<'a>,
    pub index: usize,
}

/// Capabilities the patch engines need from the host item table. Every
/// method tolerates missing data: reads return `None`/empty, writes return
/// `false`.
pub trait TemplateStore {
    fn template_ids(&self) -> Vec<String>;

    fn has_template(&self, template: &str) -> bool;

    /// Slot names in positional order; `None` for unnamed slots.
    fn slot_names(&self, template: &str, group: SlotGroup) -> Vec<Option<String>>;

    fn filter_count(&self, slot: SlotRef<'_>) -> usize;

    fn filter_ids(&self, filter: FilterRef<'_>) -> Option<Vec<String>>;

    fn add_filter_id(&mut self, filter: FilterRef<'_>, id: &str, mode: IdMatch) -> bool;

    fn replace_filter_ids(&mut self, filter: FilterRef<'_>, ids: &[String]) -> bool;

    fn clear_excluded(&mut self, filter: FilterRef<'_>) -> bool;

    fn set_plate(&mut self, filter: FilterRef<'_>, id: &str) -> bool;

    fn set_filter_locked(&mut self, filter: FilterRef<'_>, locked: bool) -> bool;

    fn set_slot_required(&mut self, slot: SlotRef<'_>, required: bool) -> bool;

    /// Makes sure the slot has at least one filter entry, creating an empty
    /// one if needed.
    fn ensure_filter(&mut self, slot: SlotRef<'_>) -> bool;
}

/// Host item table held as JSON: an object keyed by template id whose
/// values are template records in any of the historical shapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonItemTable {
    items: Map<String, Value>,
}

impl JsonItemTable {
    pub fn new(items: Map<String, Value>) -> Self {
        Self { items }
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(items) => Some(Self { items }),
            _ => None,
        }
    }

    pub fn items(&self) -> &Map<String, Value> {
        &self.items
    }

    pub fn into_items(self) -> Map<String, Value> {
        self.items
    }

    pub fn get(&self, template: &str) -> Option<&Value> {
        let key = self.resolve_key(template)?;
        self.items.get(&key)
    }

    /// Key lookup first, then the template's own id member, so tables keyed
    /// by something other than the id still resolve.
    fn resolve_key(&self, template: &str) -> Option<String> {
        if self.items.contains_key(template) {
            return Some(template.to_string());
        }
        let wanted = TemplateId::extract(template);
        self.items
            .iter()
            .find(|(_, item)| {
                let Some(id) = accessor::get(item, Member::Id).and_then(accessor::as_id_str) else {
                    return false;
                };
                match (&wanted, TemplateId::extract(id)) {
                    (Some(a), Some(b)) => *a == b,
                    _ => id == template,
                }
            })
            .map(|(key, _)| key.clone())
    }

    fn slots(&self, template: &str, group: SlotGroup) -> Option<&Vec<Value>> {
        let item = self.get(template)?;
        let props = accessor::get(item, Member::Properties)?;
        accessor::get(props, group.member())?.as_array()
    }

    fn slot(&self, slot: SlotRef<'_>) -> Option<&Value> {
        self.slots(slot.template, slot.group)?.get(slot.index)
    }

    fn slot_mut(&mut self, slot: SlotRef<'_>) -> Option<&mut Value> {
        let key = self.resolve_key(slot.template)?;
        let item = self.items.get_mut(&key)?;
        let props = accessor::get_mut(item, Member::Properties)?;
        accessor::get_mut(props, slot.group.member())?
            .as_array_mut()?
            .get_mut(slot.index)
    }

    fn filters(&self, slot: SlotRef<'_>) -> Option<&Vec<Value>> {
        let slot = self.slot(slot)?;
        accessor::get(accessor::props_or_self(slot), Member::Filters)?.as_array()
    }

    fn filter_mut(&mut self, filter: FilterRef<'_>) -> Option<&mut Value> {
        let slot = self.slot_mut(filter.slot)?;
        accessor::get_mut(accessor::props_or_self_mut(slot), Member::Filters)?
            .as_array_mut()?
            .get_mut(filter.index)
    }

    fn filter_list_mut(
        &mut self,
        filter: FilterRef<'_>,
        member: Member,
    ) -> Option<&mut Vec<Value>> {
        let entry = self.filter_mut(filter)?;
        let needs_list = !accessor::get(entry, member).is_some_and(Value::is_array);
        if needs_list && !accessor::set(entry, member, Value::Array(Vec::new())) {
            return None;
        }
        accessor::get_mut(entry, member)?.as_array_mut()
    }
}

impl TemplateStore for JsonItemTable {
    fn template_ids(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    fn has_template(&self, template: &str) -> bool {
        self.resolve_key(template).is_some()
    }

    fn slot_names(&self, template: &str, group: SlotGroup) -> Vec<Option<String>> {
        self.slots(template, group)
            .map(|slots| {
                slots
                    .iter()
                    .map(|slot| accessor::name_of(slot).map(ToOwned::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn filter_count(&self, slot: SlotRef<'_>) -> usize {
        self.filters(slot).map_or(0, Vec::len)
    }

    fn filter_ids(&self, filter: FilterRef<'_>) -> Option<Vec<String>> {
        let entry = self.filters(filter.slot)?.get(filter.index)?;
        let ids = accessor::get(entry, Member::Filter)?.as_array()?;
        Some(ids.ids().into_iter().map(|id| id.into_owned()).collect())
    }

    fn add_filter_id(&mut self, filter: FilterRef<'_>, id: &str, mode: IdMatch) -> bool {
        self.filter_list_mut(filter, Member::Filter)
            .is_some_and(|ids| add_if_missing(ids, id, mode))
    }

    fn replace_filter_ids(&mut self, filter: FilterRef<'_>, ids: &[String]) -> bool {
        let Some(list) = self.filter_list_mut(filter, Member::Filter) else {
            return false;
        };
        let shape = ElementShape::of(list);
        *list = ids.iter().map(|id| shape.build(id)).collect();
        true
    }

    fn clear_excluded(&mut self, filter: FilterRef<'_>) -> bool {
        match self.filter_list_mut(filter, Member::ExcludedFilter) {
            Some(list) => {
                list.clear();
                true
            }
            None => false,
        }
    }

    fn set_plate(&mut self, filter: FilterRef<'_>, id: &str) -> bool {
        let Some(entry) = self.filter_mut(filter) else {
            return false;
        };
        let shape = match accessor::get(entry, Member::Plate) {
            Some(Value::Object(map)) if map.contains_key("$oid") => ElementShape::Wrapped,
            _ => ElementShape::Plain,
        };
        accessor::set(entry, Member::Plate, shape.build(id))
    }

    fn set_filter_locked(&mut self, filter: FilterRef<'_>, locked: bool) -> bool {
        self.filter_mut(filter)
            .is_some_and(|entry| accessor::set(entry, Member::Locked, Value::Bool(locked)))
    }

    fn set_slot_required(&mut self, slot: SlotRef<'_>, required: bool) -> bool {
        self.slot_mut(slot)
            .is_some_and(|entry| accessor::set(entry, Member::Required, Value::Bool(required)))
    }

    fn ensure_filter(&mut self, slot: SlotRef<'_>) -> bool {
        let Some(entry) = self.slot_mut(slot) else {
            return false;
        };
        let owner = accessor::props_or_self_mut(entry);
        if !accessor::get(owner, Member::Filters).is_some_and(Value::is_array)
            && !accessor::set(owner, Member::Filters, Value::Array(Vec::new()))
        {
            return false;
        }
        let Some(filters) = accessor::get_mut(owner, Member::Filters).and_then(Value::as_array_mut)
        else {
            return false;
        };
        if filters.iter().all(Value::is_null) {
            filters.retain(|f| !f.is_null());
            let mut fresh = Map::new();
            fresh.insert(Member::Filter.canonical().to_string(), Value::Array(Vec::new()));
            filters.push(Value::Object(fresh));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const RIFLE: &str = "5447a9cd4bdc2dbd208b4567";

    fn table() -> JsonItemTable {
        JsonItemTable::from_value(json!({
            RIFLE: {
                "_id": RIFLE,
                "_props": {
                    "Slots": [
                        {"_name": "mod_magazine", "_props": {"filters": [{"Filter": ["a"], "ExcludedFilter": ["x"]}]}},
                        {"_name": "mod_stock"}
                    ],
                    "Chambers": [
                        {"_name": "patron_in_weapon", "_props": {"filters": [{"Filter": []}]}}
                    ]
                }
            }
        }))
        .expect("object table")
    }

    #[test]
    fn reads_slot_names_per_group() {
        let table = table();
        assert_eq!(
            table.slot_names(RIFLE, SlotGroup::Slots),
            vec![Some("mod_magazine".to_string()), Some("mod_stock".to_string())]
        );
        assert_eq!(table.slot_names(RIFLE, SlotGroup::Chambers).len(), 1);
        assert!(table.slot_names("missing", SlotGroup::Slots).is_empty());
    }

    #[test]
    fn filter_edits_are_written_in_place() {
        let mut table = table();
        let filter = SlotRef::new(RIFLE, SlotGroup::Slots, 0).filter(0);
        assert!(table.add_filter_id(filter, "b", IdMatch::Ordinal));
        assert!(!table.add_filter_id(filter, "a", IdMatch::Ordinal));
        assert!(table.clear_excluded(filter));
        assert_eq!(table.filter_ids(filter), Some(vec!["a".to_string(), "b".to_string()]));
        let slot = &table.get(RIFLE).unwrap()["_props"]["Slots"][0]["_props"]["filters"][0];
        assert_eq!(slot["ExcludedFilter"], json!([]));
    }

    #[test]
    fn ensure_filter_creates_missing_entries() {
        let mut table = table();
        let slot = SlotRef::new(RIFLE, SlotGroup::Slots, 1);
        assert_eq!(table.filter_count(slot), 0);
        assert!(table.ensure_filter(slot));
        assert_eq!(table.filter_count(slot), 1);
        assert_eq!(table.filter_ids(slot.filter(0)), Some(Vec::new()));
    }

    #[test]
    fn resolves_templates_by_embedded_id() {
        let table = JsonItemTable::from_value(json!({
            "rifle": {"_id": {"$oid": RIFLE}, "_props": {}}
        }))
        .expect("object table");
        assert!(table.has_template(RIFLE));
        assert!(!table.has_template("6946eb7e67ba8110a6ddfd5e"));
    }

    #[test]
    fn out_of_range_addresses_are_no_ops() {
        let mut table = table();
        let filter = SlotRef::new(RIFLE, SlotGroup::Slots, 9).filter(0);
        assert!(!table.set_plate(filter, "a"));
        assert!(!table.set_slot_required(filter.slot, true));
        assert_eq!(table.filter_ids(filter), None);
    }
}
