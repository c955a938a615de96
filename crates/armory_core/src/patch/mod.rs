//! Optional template patches applied once the host item database is loaded.
//!
//! Every engine follows the same lifecycle: load its configuration, scan
//! templates, patch matching slots. [`run_engine`] drives it and turns any
//! failure into an [`EngineOutcome`] so callers can log and move on.

mod ballistic;
mod built_in;
mod salcos;

pub use ballistic::{BallisticPlateCompat, PlateMapping, PlateMappings};
pub use built_in::{
    BuiltInPlatePatcher, DEFAULT_PLATE_TPL, RIG_TPL, RigPlan, SOFT_BACK_TPL, SOFT_FRONT_TPL,
    SOFT_GROIN_TPL, SlotDefault, default_plan,
};
pub use salcos::{FilterMergePolicy, SalcosCompat, SlotOverride, WeaponOverrides};

use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::store::TemplateStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub templates_scanned: usize,
    pub templates_patched: usize,
    pub slots_patched: usize,
    pub ids_added: usize,
}

impl PatchReport {
    pub fn is_empty(&self) -> bool {
        self.templates_patched == 0 && self.slots_patched == 0 && self.ids_added == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// No usable configuration was found.
    Skipped,
    Applied(PatchReport),
    Failed(CoreError),
}

pub trait PatchEngine {
    const NAME: &'static str;

    type Config;

    /// `Ok(None)` means there is nothing to do.
    fn load_config(&self) -> Result<Option<Self::Config>, CoreError>;

    fn apply(
        &self,
        config: &Self::Config,
        store: &mut dyn TemplateStore,
    ) -> Result<PatchReport, CoreError>;
}

pub fn run_engine<E: PatchEngine>(engine: &E, store: &mut dyn TemplateStore) -> EngineOutcome {
    let config = match engine.load_config() {
        Ok(Some(config)) => config,
        Ok(None) => {
            debug!(engine = E::NAME, "no usable configuration, skipping");
            return EngineOutcome::Skipped;
        }
        Err(e) => {
            warn!(engine = E::NAME, error = %e, "failed to load configuration");
            return EngineOutcome::Failed(e);
        }
    };

    match engine.apply(&config, store) {
        Ok(report) => {
            info!(
                engine = E::NAME,
                scanned = report.templates_scanned,
                templates = report.templates_patched,
                slots = report.slots_patched,
                ids = report.ids_added,
                "patch applied"
            );
            EngineOutcome::Applied(report)
        }
        Err(e) => {
            warn!(engine = E::NAME, error = %e, "patch abandoned");
            EngineOutcome::Failed(e)
        }
    }
}
