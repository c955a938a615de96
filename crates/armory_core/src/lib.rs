pub mod accessor;
pub mod assort;
pub mod coerce;
pub mod config;
mod error;
pub mod hex24;
pub mod jsonc;
pub mod patch;
pub mod store;

pub use assort::{AssortDocument, AssortMerger, RepairReport};
pub use config::{ArmorySettings, ModPaths};
pub use error::{CoreError, CoreErrorCode};
pub use hex24::TemplateId;
pub use patch::{EngineOutcome, PatchEngine, PatchReport, run_engine};
pub use store::{JsonItemTable, TemplateStore};
