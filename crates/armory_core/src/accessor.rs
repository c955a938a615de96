//! Case-insensitive member access on host objects of unknown shape.
//!
//! Host records changed member names across versions (`_props` vs
//! `Properties`, `_name` vs `Name`, ...). Each [`Member`] lists every name
//! seen in the wild; the first alias is the canonical one used on insert.
//! Nothing here fails: a missing member or a non-object target reads as
//! `None` and writes as a no-op.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Id,
    Name,
    Properties,
    Slots,
    Chambers,
    Filters,
    Filter,
    ExcludedFilter,
    Plate,
    Locked,
    Required,
}

impl Member {
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Id => &["_id", "Id", "id"],
            Self::Name => &["_name", "Name", "SlotName"],
            Self::Properties => &["_props", "Properties", "properties", "Props"],
            Self::Slots => &["Slots", "slots"],
            Self::Chambers => &["Chambers", "chambers"],
            Self::Filters => &["filters", "Filters"],
            Self::Filter => &["Filter", "filter"],
            Self::ExcludedFilter => &["ExcludedFilter", "excludedFilter"],
            Self::Plate => &["Plate", "plate"],
            Self::Locked => &["locked", "Locked"],
            Self::Required => &["_required", "Required", "required"],
        }
    }

    pub fn canonical(self) -> &'static str {
        self.aliases()[0]
    }
}

pub fn get(target: &Value, member: Member) -> Option<&Value> {
    let object = target.as_object()?;
    let key = find_key(object, member)?;
    object.get(&key)
}

pub fn get_mut(target: &mut Value, member: Member) -> Option<&mut Value> {
    let object = target.as_object_mut()?;
    let key = find_key(object, member)?;
    object.get_mut(&key)
}

/// Overwrites the member under whichever alias the object already uses, or
/// inserts it under the canonical alias. Returns `false` for non-objects.
pub fn set(target: &mut Value, member: Member, value: Value) -> bool {
    let Some(object) = target.as_object_mut() else {
        return false;
    };
    let key = find_key(object, member).unwrap_or_else(|| member.canonical().to_string());
    object.insert(key, value);
    true
}

/// Reads an id stored either as a plain string or as `{"$oid": "..."}`.
pub fn as_id_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("$oid").and_then(Value::as_str),
        _ => None,
    }
}

pub fn name_of(target: &Value) -> Option<&str> {
    get(target, Member::Name).and_then(Value::as_str)
}

/// Slot-like records keep their payload under a properties member, but some
/// authors flattened it into the slot itself.
pub fn props_or_self(target: &Value) -> &Value {
    match get(target, Member::Properties) {
        Some(props) if props.is_object() => props,
        _ => target,
    }
}

pub fn props_or_self_mut(target: &mut Value) -> &mut Value {
    let key = target
        .as_object()
        .and_then(|object| find_key(object, Member::Properties))
        .filter(|key| target[key.as_str()].is_object());
    match key {
        Some(key) => &mut target[key.as_str()],
        None => target,
    }
}

fn find_key(object: &Map<String, Value>, member: Member) -> Option<String> {
    let aliases = member.aliases();
    if let Some(exact) = aliases.iter().find(|alias| object.contains_key(**alias)) {
        return Some((*exact).to_string());
    }
    object
        .keys()
        .find(|key| aliases.iter().any(|alias| key.eq_ignore_ascii_case(alias)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn get_tries_every_alias() {
        let legacy = json!({"_props": {"Slots": []}});
        let modern = json!({"Properties": {"slots": []}});
        assert!(get(&legacy, Member::Properties).is_some());
        assert!(get(&modern, Member::Properties).is_some());
        assert!(get(get(&modern, Member::Properties).unwrap(), Member::Slots).is_some());
    }

    #[test]
    fn get_falls_back_to_case_insensitive_match() {
        let odd = json!({"PROPERTIES": {"x": 1}});
        assert_eq!(get(&odd, Member::Properties), Some(&json!({"x": 1})));
    }

    #[test]
    fn missing_members_and_non_objects_degrade_quietly() {
        assert!(get(&json!({}), Member::Slots).is_none());
        assert!(get(&json!([1, 2]), Member::Slots).is_none());
        let mut scalar = json!("text");
        assert!(!set(&mut scalar, Member::Locked, json!(true)));
    }

    #[test]
    fn set_keeps_existing_alias_and_inserts_canonical() {
        let mut filter = json!({"Locked": false});
        assert!(set(&mut filter, Member::Locked, json!(true)));
        assert!(set(&mut filter, Member::Plate, json!("656fae5f7c2d57afe200c0d7")));
        assert_eq!(
            filter,
            json!({"Locked": true, "Plate": "656fae5f7c2d57afe200c0d7"})
        );
    }

    #[test]
    fn reads_wrapped_ids() {
        assert_eq!(as_id_str(&json!({"$oid": "abc"})), Some("abc"));
        assert_eq!(as_id_str(&json!("abc")), Some("abc"));
        assert_eq!(as_id_str(&json!(12)), None);
    }
}
