use std::path::Path;

use armory_core::assort::AssortDocument;
use armory_core::store::TemplateStore;

use crate::base::TraderBase;

/// Quest-assort groups every freshly registered trader starts with.
pub const QUEST_ASSORT_GROUPS: [&str; 3] = ["Started", "Success", "Fail"];

/// What the bootstrap needs from the game server. The server integration
/// implements this over its own tables; tests use an in-memory fake.
pub trait Host {
    /// Serves `file` when a client requests `route`.
    fn add_image_route(&mut self, route: &str, file: &Path);

    /// Registers `base` with an empty assort and empty
    /// [`QUEST_ASSORT_GROUPS`]. Returns `false` if the id is already taken.
    fn add_trader(&mut self, base: &TraderBase) -> bool;

    fn set_refresh_window(&mut self, trader_id: &str, min_secs: u32, max_secs: u32);

    fn enable_on_flea(&mut self, trader_id: &str);

    /// Adds `(key, text)` pairs to every loaded locale.
    fn add_locale_entries(&mut self, entries: &[(String, String)]);

    /// Replaces a registered trader's assort. Returns `false` for unknown
    /// traders.
    fn overwrite_assort(&mut self, trader_id: &str, assort: AssortDocument) -> bool;

    /// The item template table the patch engines run against.
    fn templates(&mut self) -> &mut dyn TemplateStore;
}
