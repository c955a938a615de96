use std::fs;
use std::path::Path;

use armory_core::assort::{AssortDocument, AssortMerger};
use armory_core::patch::{BallisticPlateCompat, BuiltInPlatePatcher, SalcosCompat};
use armory_core::{
    ArmorySettings, CoreError, CoreErrorCode, EngineOutcome, ModPaths, PatchEngine, jsonc,
    run_engine,
};
use tracing::{debug, info, warn};

use crate::base::{
    AVATAR_FILE, DEFAULT_DESCRIPTION, DEFAULT_FIRST_NAME, TraderBase, find_file_case_insensitive,
};
use crate::host::Host;
use crate::routes::{avatar_routes, quest_icon_routes};

pub const MERGED_ASSORT_TMP: &str = "__merged_assort.tmp.json";

/// What a successful trader registration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTrader {
    pub id: String,
    pub avatar_routes: usize,
    pub assort_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub trader: Result<RegisteredTrader, CoreError>,
    pub quest_icons: usize,
    /// Engine name and outcome, in run order.
    pub engines: Vec<(&'static str, EngineOutcome)>,
}

impl BootstrapReport {
    pub fn engine(&self, name: &str) -> Option<&EngineOutcome> {
        self.engines
            .iter()
            .find(|(engine, _)| *engine == name)
            .map(|(_, outcome)| outcome)
    }
}

/// Startup entry point: registers the trader, installs its merged assort,
/// then runs the template patches against the host's item table. Nothing
/// here aborts startup; failures end up in the report.
pub fn bootstrap(host: &mut dyn Host, paths: &ModPaths) -> BootstrapReport {
    let settings = ArmorySettings::load(&paths.settings_file());

    let trader = register_trader(host, paths, &settings);
    if let Err(e) = &trader {
        warn!(trader_dir = %paths.trader_dir().display(), error = %e, "trader not registered");
    }

    let quest_icons = register_quest_icons(host, paths.root());

    let mut engines = Vec::with_capacity(3);
    engines.push((
        BuiltInPlatePatcher::NAME,
        run_engine(&BuiltInPlatePatcher::new(), host.templates()),
    ));
    engines.push((
        SalcosCompat::NAME,
        run_engine(
            &SalcosCompat::new(paths.weapons_dir(), settings.salcos_filter_policy),
            host.templates(),
        ),
    ));
    engines.push((
        BallisticPlateCompat::NAME,
        run_engine(&BallisticPlateCompat::new(paths.ballistic_config()), host.templates()),
    ));

    info!(
        trader = trader.is_ok(),
        quest_icons,
        failed_engines = engines
            .iter()
            .filter(|(_, outcome)| matches!(outcome, EngineOutcome::Failed(_)))
            .count(),
        "armory loaded"
    );

    BootstrapReport {
        trader,
        quest_icons,
        engines,
    }
}

fn register_trader(
    host: &mut dyn Host,
    paths: &ModPaths,
    settings: &ArmorySettings,
) -> Result<RegisteredTrader, CoreError> {
    let trader_dir = paths.trader_dir();
    let base = TraderBase::load(&trader_dir)?;

    let avatar_routes = register_avatar(host, &trader_dir, &base);

    let (min_secs, max_secs) = settings.refresh_window();
    host.set_refresh_window(&base.id, min_secs, max_secs);
    if settings.enable_on_flea {
        host.enable_on_flea(&base.id);
    }
    if !host.add_trader(&base) {
        warn!(id = %base.id, "trader id already registered, reusing it");
    }

    let first_name = settings
        .trader_first_name
        .as_deref()
        .unwrap_or(DEFAULT_FIRST_NAME);
    let description = settings
        .trader_description
        .as_deref()
        .unwrap_or(DEFAULT_DESCRIPTION);
    host.add_locale_entries(&locale_entries(&base, first_name, description));

    let assort = AssortMerger::default().merge(&trader_dir);
    let assort_items = install_assort(host, &trader_dir, &base.id, &assort)?;

    info!(id = %base.id, assort_items, avatar_routes, "trader registered");
    Ok(RegisteredTrader {
        id: base.id,
        avatar_routes,
        assort_items,
    })
}

fn register_avatar(host: &mut dyn Host, trader_dir: &Path, base: &TraderBase) -> usize {
    let Some(avatar) = base.avatar.as_deref() else {
        debug!(id = %base.id, "trader has no avatar route");
        return 0;
    };
    let Some(image) = find_file_case_insensitive(trader_dir, AVATAR_FILE) else {
        warn!(trader_dir = %trader_dir.display(), file = AVATAR_FILE, "avatar image missing");
        return 0;
    };
    let routes = avatar_routes(avatar);
    for route in &routes {
        host.add_image_route(route, &image);
    }
    routes.len()
}

fn register_quest_icons(host: &mut dyn Host, mod_root: &Path) -> usize {
    let routes = quest_icon_routes(mod_root);
    for (route, file) in &routes {
        host.add_image_route(route, file);
    }
    routes.len()
}

/// Locale keys the client looks the trader's texts up by.
pub fn locale_entries(
    base: &TraderBase,
    first_name: &str,
    description: &str,
) -> Vec<(String, String)> {
    let id = base.id.trim();
    if id.is_empty() {
        return Vec::new();
    }
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    vec![
        (format!("{id} FullName"), text(&base.name)),
        (format!("{id} FirstName"), first_name.to_string()),
        (format!("{id} Nickname"), text(&base.nickname)),
        (format!("{id} Location"), text(&base.location)),
        (format!("{id} Description"), description.to_string()),
    ]
}

/// Round-trips `assort` through a temporary file in `trader_dir` so the host
/// receives exactly what a file-based load would produce, then hands it
/// over. Returns the number of installed items.
pub fn install_assort(
    host: &mut dyn Host,
    trader_dir: &Path,
    trader_id: &str,
    assort: &AssortDocument,
) -> Result<usize, CoreError> {
    let tmp = trader_dir.join(MERGED_ASSORT_TMP);
    let text = serde_json::to_string(assort)?;
    fs::write(&tmp, text).map_err(|e| CoreError::io(&tmp, e))?;

    let reloaded = jsonc::read_file_as::<AssortDocument>(&tmp);
    if let Err(e) = fs::remove_file(&tmp) {
        debug!(path = %tmp.display(), error = %e, "could not remove temporary assort");
    }
    let reloaded = reloaded?;

    let items = reloaded.items.len();
    if !host.overwrite_assort(trader_id, reloaded) {
        return Err(CoreError::new(
            CoreErrorCode::Shape,
            format!("trader {trader_id} is not registered with the host"),
        ));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_entries_use_empty_text_for_missing_fields() {
        let base = TraderBase {
            id: "6946f4000000000000000001".to_string(),
            name: Some("Odin Armory".to_string()),
            ..TraderBase::default()
        };
        let entries = locale_entries(&base, "Odin", "desc");
        assert_eq!(entries.len(), 5);
        assert_eq!(
            entries[0],
            ("6946f4000000000000000001 FullName".to_string(), "Odin Armory".to_string())
        );
        assert_eq!(entries[2].1, "");
        assert_eq!(entries[4].1, "desc");
    }

    #[test]
    fn anonymous_trader_gets_no_locale_entries() {
        assert!(locale_entries(&TraderBase::default(), "Odin", "desc").is_empty());
    }

    #[test]
    fn report_looks_engines_up_by_name() {
        let report = BootstrapReport {
            trader: Err(CoreError::new(CoreErrorCode::Io, "missing")),
            quest_icons: 0,
            engines: vec![(SalcosCompat::NAME, EngineOutcome::Skipped)],
        };
        assert_eq!(report.engine("salcos-compat"), Some(&EngineOutcome::Skipped));
        assert_eq!(report.engine("nope"), None);
    }
}
