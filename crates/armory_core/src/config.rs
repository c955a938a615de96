//! Where the mod's files live and the user-editable settings file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::jsonc;
use crate::patch::FilterMergePolicy;

pub const SETTINGS_FILE: &str = "Config/SalcosArmory.jsonc";
pub const BALLISTIC_CONFIG_FILE: &str = "Config/BallisticPlateCompat.jsonc";
pub const WEAPONS_DIR: &str = "Weapons";
pub const TRADER_DIR: &str = "TraderOdin";

/// Paths derived from the mod's install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModPaths {
    pub root: PathBuf,
}

impl ModPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ballistic_config(&self) -> PathBuf {
        self.root.join(BALLISTIC_CONFIG_FILE)
    }

    pub fn weapons_dir(&self) -> PathBuf {
        self.root.join(WEAPONS_DIR)
    }

    pub fn trader_dir(&self) -> PathBuf {
        self.root.join(TRADER_DIR)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArmorySettings {
    pub salcos_filter_policy: FilterMergePolicy,
    /// Overrides the trader's built-in first name.
    pub trader_first_name: Option<String>,
    pub trader_description: Option<String>,
    pub refresh_min_secs: u32,
    pub refresh_max_secs: u32,
    pub enable_on_flea: bool,
}

impl Default for ArmorySettings {
    fn default() -> Self {
        Self {
            salcos_filter_policy: FilterMergePolicy::default(),
            trader_first_name: None,
            trader_description: None,
            refresh_min_secs: 3600,
            refresh_max_secs: 7200,
            enable_on_flea: true,
        }
    }
}

impl ArmorySettings {
    /// Never fails: a missing file gives defaults, a malformed one gives
    /// defaults and a warning.
    pub fn load(path: &Path) -> Self {
        if !path.is_file() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        }
        match jsonc::read_file_as::<Self>(path) {
            Ok(settings) => settings.normalized(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed settings file, using defaults");
                Self::default()
            }
        }
    }

    /// `(min, max)` with the bounds swapped back into order if needed.
    pub fn refresh_window(&self) -> (u32, u32) {
        if self.refresh_min_secs <= self.refresh_max_secs {
            (self.refresh_min_secs, self.refresh_max_secs)
        } else {
            (self.refresh_max_secs, self.refresh_min_secs)
        }
    }

    fn normalized(mut self) -> Self {
        let blank = |s: &Option<String>| s.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&self.trader_first_name) {
            self.trader_first_name = None;
        }
        if blank(&self.trader_description) {
            self.trader_description = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn paths_hang_off_the_mod_root() {
        let paths = ModPaths::new("/mods/armory");
        assert_eq!(
            paths.ballistic_config(),
            PathBuf::from("/mods/armory/Config/BallisticPlateCompat.jsonc")
        );
        assert_eq!(paths.weapons_dir(), PathBuf::from("/mods/armory/Weapons"));
        assert_eq!(paths.trader_dir(), PathBuf::from("/mods/armory/TraderOdin"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ArmorySettings::load(&dir.path().join("nope.jsonc"));
        assert_eq!(settings, ArmorySettings::default());
        assert_eq!(settings.refresh_window(), (3600, 7200));
        assert!(settings.enable_on_flea);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("SalcosArmory.jsonc");
        fs::write(
            &path,
            r#"{
                // switch to append mode
                "salcosFilterPolicy": "append",
                "traderFirstName": "  ",
                "refreshMinSecs": 9000,
            }"#,
        )
        .expect("write settings");

        let settings = ArmorySettings::load(&path);
        assert_eq!(settings.salcos_filter_policy, FilterMergePolicy::Append);
        assert_eq!(settings.trader_first_name, None);
        assert_eq!(settings.refresh_window(), (7200, 9000));
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("SalcosArmory.jsonc");
        fs::write(&path, "{ not json").expect("write settings");
        assert_eq!(ArmorySettings::load(&path), ArmorySettings::default());
    }
}
