//! Catalog selection & custom-entry persistence for the workforce-planning
//! intake form.
//!
//! Two picker domains (organizations by business pillar, locations by
//! region) share one implementation: a compiled-in taxonomy, a per-user
//! custom-entry store with remote-then-local-cache fallback, a merger that
//! folds custom entries back into the catalog, and the picker state
//! machine presentation drives.

pub mod merge;
pub mod selector;
pub mod settings;
pub mod store;
pub mod taxonomy;

pub use merge::{merge, GroupSection, MergedCatalog};
pub use selector::{Commit, SelectorController, SelectorState, SelectorView};
pub use store::{CacheDb, CustomEntry, CustomEntryStore, HttpRemote, RemoteBackend, RemoteError};
pub use taxonomy::{CatalogItem, Taxonomy, CUSTOM_GROUP, GLOBAL_GROUP};
