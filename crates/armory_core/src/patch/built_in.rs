//! Default plate wiring for the armory's own plate carrier: soft armor ships
//! fixed in place, hard plates stay the player's choice.

use crate::error::CoreError;
use crate::store::{SlotGroup, SlotRef, TemplateStore};

use super::{PatchEngine, PatchReport};

pub const RIG_TPL: &str = "6946eb7e67ba8110a6ddfd5e";
pub const SOFT_FRONT_TPL: &str = "6946ebb44e3088ef0bb4dfbe";
pub const SOFT_BACK_TPL: &str = "6946ebbacf8f3b61ff54d3eb";
pub const SOFT_GROIN_TPL: &str = "6946ebc505411b23e69d540f";
pub const DEFAULT_PLATE_TPL: &str = "656fae5f7c2d57afe200c0d7";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDefault {
    /// Filter and plate forced to one insert; locked and required.
    FixedSoftArmor(&'static str),
    /// Plate preset only; unlocked and optional.
    SwappablePlate(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RigPlan {
    pub rig: &'static str,
    pub slots: Vec<(&'static str, SlotDefault)>,
}

pub fn default_plan() -> RigPlan {
    RigPlan {
        rig: RIG_TPL,
        slots: vec![
            ("Soft_armor_front", SlotDefault::FixedSoftArmor(SOFT_FRONT_TPL)),
            ("Soft_armor_back", SlotDefault::FixedSoftArmor(SOFT_BACK_TPL)),
            ("Groin", SlotDefault::FixedSoftArmor(SOFT_GROIN_TPL)),
            ("Front_plate", SlotDefault::SwappablePlate(DEFAULT_PLATE_TPL)),
            ("Back_plate", SlotDefault::SwappablePlate(DEFAULT_PLATE_TPL)),
        ],
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltInPlatePatcher;

impl BuiltInPlatePatcher {
    pub fn new() -> Self {
        Self
    }
}

impl PatchEngine for BuiltInPlatePatcher {
    const NAME: &'static str = "built-in-plate-patcher";

    type Config = RigPlan;

    fn load_config(&self) -> Result<Option<RigPlan>, CoreError> {
        Ok(Some(default_plan()))
    }

    fn apply(
        &self,
        plan: &RigPlan,
        store: &mut dyn TemplateStore,
    ) -> Result<PatchReport, CoreError> {
        let mut report = PatchReport::default();
        if !store.has_template(plan.rig) {
            return Ok(report);
        }
        report.templates_scanned = 1;

        let names = store.slot_names(plan.rig, SlotGroup::Slots);
        for (slot_name, default) in &plan.slots {
            let Some(index) = names.iter().position(|name| {
                name.as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(slot_name))
            }) else {
                continue;
            };
            let slot = SlotRef::new(plan.rig, SlotGroup::Slots, index);
            if patch_slot(store, slot, *default) {
                report.slots_patched += 1;
            }
        }

        if report.slots_patched > 0 {
            report.templates_patched = 1;
        }
        Ok(report)
    }
}

fn patch_slot(store: &mut dyn TemplateStore, slot: SlotRef<'_>, default: SlotDefault) -> bool {
    let filter_count = store.filter_count(slot);
    match default {
        SlotDefault::FixedSoftArmor(tpl) => {
            for index in 0..filter_count {
                let filter = slot.filter(index);
                store.replace_filter_ids(filter, &[tpl.to_string()]);
                store.set_plate(filter, tpl);
                store.set_filter_locked(filter, true);
            }
            store.set_slot_required(slot, true)
        }
        SlotDefault::SwappablePlate(tpl) => {
            for index in 0..filter_count {
                let filter = slot.filter(index);
                store.set_plate(filter, tpl);
                store.set_filter_locked(filter, false);
            }
            store.set_slot_required(slot, false)
        }
    }
}
