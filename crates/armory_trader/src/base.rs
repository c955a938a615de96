use std::fs;
use std::path::{Path, PathBuf};

use armory_core::{CoreError, CoreErrorCode, jsonc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const BASE_FILE: &str = "base.json";
pub const AVATAR_FILE: &str = "Odin.png";
pub const DEFAULT_FIRST_NAME: &str = "Odin";
pub const DEFAULT_DESCRIPTION: &str = "He is a former KSK elite soldier of the German Federal Armed Forces. \
He lost his right eye in combat, after which he was nicknamed Odin. His real name, origin, and age are unknown. \
He is an incredibly skilled marksman and weapons specialist. He is also an excellent gunsmith. \
He is more or less neutral towards all factions in Tarkov, but maintains a particularly good relationship \
with Mechanic, Prapor, and Sanitar.";

/// Identity of the mod as announced to the host's loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModMetadata {
    pub guid: &'static str,
    pub name: &'static str,
    pub author: &'static str,
    pub version: &'static str,
    /// Semver range of host versions this build loads on.
    pub host_range: &'static str,
    pub license: &'static str,
    pub is_bundle_mod: bool,
}

impl ModMetadata {
    pub const SALCOS_ARMORY: Self = Self {
        guid: "com.salco.salcosarmory",
        name: "Salco's Armory",
        author: "Salco",
        version: "1.2.0",
        host_range: "~4.0.0",
        license: "MIT",
        is_bundle_mod: true,
    };
}

/// The trader record from `base.json`. Only the fields the bootstrap reads
/// are typed; the rest ride along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraderBase {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TraderBase {
    /// Loads `base.json` from `trader_dir`, whatever the filename's casing.
    pub fn load(trader_dir: &Path) -> Result<Self, CoreError> {
        let path = find_file_case_insensitive(trader_dir, BASE_FILE).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("no {BASE_FILE} in {}", trader_dir.display()),
            )
        })?;
        let base: Self = jsonc::read_file_as(&path)?;
        if base.id.trim().is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::Shape,
                format!("{} has an empty _id", path.display()),
            ));
        }
        Ok(base)
    }
}

pub(crate) fn find_file_case_insensitive(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.is_file() {
        return Some(exact);
    }
    fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .is_some_and(|file| file.to_string_lossy().eq_ignore_ascii_case(name))
        })
}
