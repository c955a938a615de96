//! Server-side glue for Salco's Armory: registers the Odin trader with the
//! host and runs the template patches once the item database is loaded.

mod base;
mod bootstrap;
mod host;
mod routes;

pub use base::{
    AVATAR_FILE, BASE_FILE, DEFAULT_DESCRIPTION, DEFAULT_FIRST_NAME, ModMetadata, TraderBase,
};
pub use bootstrap::{
    BootstrapReport, MERGED_ASSORT_TMP, RegisteredTrader, bootstrap, install_assort,
    locale_entries,
};
pub use host::{Host, QUEST_ASSORT_GROUPS};
pub use routes::{QUEST_ICON_PREFIX, avatar_routes, quest_icon_routes};
