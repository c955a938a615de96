mod common;

use std::path::Path;

use armory_core::patch::{DEFAULT_PLATE_TPL, RIG_TPL, SOFT_FRONT_TPL};
use armory_core::{CoreErrorCode, EngineOutcome, ModPaths};
use armory_trader::{MERGED_ASSORT_TMP, ModMetadata, bootstrap};
use common::{FakeHost, write};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const TRADER_ID: &str = "6946f5000000000000000001";
const PISTOL: &str = "5448bd6b4bdc2dfc2f8b4569";
const NEW_MAG: &str = "6946ed0a1b2c3d4e5f607190";
const SOURCE_PLATE: &str = "656fae5f7c2d57afe200c0d7";
const CLONE_PLATE: &str = "6946ec0a1b2c3d4e5f607182";

fn items() -> Value {
    json!({
        RIG_TPL: {
            "_id": RIG_TPL,
            "_props": {"Slots": [
                {"_name": "Soft_armor_front", "_props": {"filters": [{"Filter": [], "locked": false}]}},
                {"_name": "Front_plate", "_props": {"filters": [{"Filter": [SOURCE_PLATE], "Plate": ""}]}}
            ]}
        },
        PISTOL: {
            "_id": PISTOL,
            "_props": {"Slots": [
                {"_name": "mod_magazine", "_props": {"filters": [{"Filter": ["5448c12b4bdc2d02308b456f"]}]}}
            ]}
        }
    })
}

fn install_mod(root: &Path) {
    let trader = root.join("TraderOdin");
    write(
        &trader.join("base.json"),
        &json!({
            "_id": TRADER_ID,
            "name": "Odin",
            "nickname": "Odin",
            "location": "Unknown",
            "avatar": "/files/trader/avatar/Odin.png",
            "currency": "RUB"
        })
        .to_string(),
    );
    write(&trader.join("Odin.png"), "png");
    write(
        &trader.join("AssortWeapons/pistol.json"),
        &json!({
            "items": [
                {"_id": "not-an-id", "_tpl": PISTOL, "parentId": "hideout", "slotId": "hideout"},
                {"_id": "mag", "_tpl": "5448c12b4bdc2d02308b456f", "parentId": "not-an-id", "slotId": "mod_magazine"}
            ],
            "barter_scheme": {"not-an-id": [[{"count": 25000, "_tpl": "5449016a4bdc2d6f028b456f"}]]},
            "loyal_level_items": {"not-an-id": 1}
        })
        .to_string(),
    );
    write(
        &root.join("Weapons/pistol.json"),
        &json!({PISTOL: {"salcosCompat": {"slotOverrides": [{"slotName": "mag_pistol", "filterTpls": [NEW_MAG]}]}}})
            .to_string(),
    );
    write(
        &root.join("Config/BallisticPlateCompat.jsonc"),
        &format!(r#"{{ "mappings": [{{ "sourcePlateTpl": "{SOURCE_PLATE}", "clonePlateTpls": ["{CLONE_PLATE}"] }}] }}"#),
    );
    write(
        &root.join("Config/SalcosArmory.jsonc"),
        r#"{ "refreshMinSecs": 1800, "enableOnFlea": false, "traderDescription": "Sells guns." }"#,
    );
    write(&root.join("db/CustomQuests/Odin/Images/intro.png"), "png");
}

#[test]
fn full_startup_registers_trader_and_patches_templates() {
    let dir = tempfile::tempdir().expect("tempdir");
    install_mod(dir.path());
    let mut host = FakeHost::with_items(items());

    let report = bootstrap(&mut host, &ModPaths::new(dir.path()));

    let trader = report.trader.as_ref().expect("trader registered");
    assert_eq!(trader.id, TRADER_ID);
    assert_eq!(trader.avatar_routes, 3);
    assert_eq!(trader.assort_items, 2);
    assert_eq!(report.quest_icons, 1);

    let avatar = dir.path().join("TraderOdin/Odin.png");
    assert_eq!(host.route("/files/trader/avatar/Odin"), Some(avatar.as_path()));
    assert_eq!(host.route("Odin"), Some(avatar.as_path()));
    assert!(host.route("/files/quest/icon/intro").is_some());

    assert_eq!(host.refresh.get(TRADER_ID), Some(&(1800, 7200)));
    assert!(host.flea.is_empty());
    assert_eq!(host.locale[&format!("{TRADER_ID} FirstName")], "Odin");
    assert_eq!(host.locale[&format!("{TRADER_ID} Description")], "Sells guns.");
    assert_eq!(host.locale[&format!("{TRADER_ID} Location")], "Unknown");

    let registered = &host.traders[TRADER_ID];
    assert_eq!(registered.base.extra.get("currency"), Some(&json!("RUB")));
    assert_eq!(registered.quest_assort.len(), 3);

    let assort = &registered.assort;
    let root_id = assort.items[0]["_id"].as_str().expect("root id");
    assert_eq!(assort.items[1]["parentId"], json!(root_id));
    assert!(assort.barter_scheme.contains_key(root_id));
    assert_eq!(assort.loyal_level_items.get(root_id), Some(&json!(1)));
    assert!(!dir.path().join("TraderOdin").join(MERGED_ASSORT_TMP).exists());

    let names: Vec<&str> = report.engines.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec!["built-in-plate-patcher", "salcos-compat", "ballistic-plate-compat"]
    );
    assert!(report
        .engines
        .iter()
        .all(|(_, outcome)| matches!(outcome, EngineOutcome::Applied(_))));

    let rig = host.table.get(RIG_TPL).expect("rig");
    let soft = &rig["_props"]["Slots"][0]["_props"]["filters"][0];
    assert_eq!(soft["Filter"], json!([SOFT_FRONT_TPL]));
    assert_eq!(soft["locked"], json!(true));
    let plate = &rig["_props"]["Slots"][1]["_props"]["filters"][0];
    assert_eq!(plate["Plate"], json!(DEFAULT_PLATE_TPL));
    assert_eq!(plate["Filter"], json!([SOURCE_PLATE, CLONE_PLATE]));

    let pistol = host.table.get(PISTOL).expect("pistol");
    assert_eq!(
        pistol["_props"]["Slots"][0]["_props"]["filters"][0]["Filter"],
        json!([NEW_MAG])
    );
}

#[test]
fn missing_base_is_reported_but_patches_still_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir.path().join("Config/BallisticPlateCompat.jsonc"),
        &format!(r#"{{ "mappings": [{{ "sourcePlateTpl": "{SOURCE_PLATE}", "clonePlateTpls": ["{CLONE_PLATE}"] }}] }}"#),
    );
    let mut host = FakeHost::with_items(items());

    let report = bootstrap(&mut host, &ModPaths::new(dir.path()));

    let error = report.trader.as_ref().expect_err("no base.json");
    assert_eq!(error.code, CoreErrorCode::Io);
    assert!(host.traders.is_empty());
    assert!(host.locale.is_empty());
    assert_eq!(report.engine("salcos-compat"), Some(&EngineOutcome::Skipped));
    assert!(matches!(
        report.engine("ballistic-plate-compat"),
        Some(EngineOutcome::Applied(r)) if r.ids_added == 1
    ));
}

#[test]
fn malformed_settings_fall_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    install_mod(dir.path());
    write(&dir.path().join("Config/SalcosArmory.jsonc"), "{ refresh: ");
    let mut host = FakeHost::with_items(json!({}));

    let report = bootstrap(&mut host, &ModPaths::new(dir.path()));

    assert!(report.trader.is_ok());
    assert_eq!(host.refresh.get(TRADER_ID), Some(&(3600, 7200)));
    assert_eq!(host.flea, vec![TRADER_ID.to_string()]);
    assert!(host.locale[&format!("{TRADER_ID} Description")].starts_with("He is a former KSK"));
}

#[test]
fn metadata_matches_the_published_mod() {
    let meta = ModMetadata::SALCOS_ARMORY;
    assert_eq!(meta.guid, "com.salco.salcosarmory");
    assert_eq!(meta.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(meta.host_range, "~4.0.0");
    assert_eq!(meta.license, "MIT");
}
