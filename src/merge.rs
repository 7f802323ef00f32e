//! Merges a domain taxonomy with a user's custom entries into one grouped
//! catalog.
//!
//! Pure and synchronous. The merged catalog is request-scoped: callers
//! rebuild it after every store read or write instead of caching it across
//! sessions.

use serde::Serialize;

use crate::store::CustomEntry;
use crate::taxonomy::{CatalogItem, Taxonomy, CUSTOM_GROUP};

/// One group's slice of the merged catalog, in taxonomy group order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSection {
    pub group: String,
    pub items: Vec<CatalogItem>,
}

/// Taxonomy items plus the user's custom entries, grouped. Groups with no
/// items are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedCatalog {
    pub sections: Vec<GroupSection>,
}

impl MergedCatalog {
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }
}

/// Build the merged catalog. Custom entries are projected to code-less
/// items and appended after the static items, so within a group static
/// items come first. A dynamic item whose name case-insensitively matches
/// a static item is dropped: a custom entry never shadows a canonical one.
pub fn merge(taxonomy: &Taxonomy, entries: &[CustomEntry]) -> MergedCatalog {
    let mut combined: Vec<CatalogItem> = taxonomy.items().to_vec();

    for entry in entries {
        let taken = combined
            .iter()
            .any(|i| i.name.to_lowercase() == entry.name.to_lowercase());
        if taken {
            continue;
        }
        // A persisted group that is no longer in the taxonomy lands in
        // Custom rather than producing an unknown section.
        let group = if taxonomy.is_valid_group(&entry.group) {
            entry.group.as_str()
        } else {
            CUSTOM_GROUP
        };
        combined.push(CatalogItem::new(&entry.name, group));
    }

    let sections = taxonomy
        .groups()
        .iter()
        .filter_map(|group| {
            let items: Vec<CatalogItem> = combined
                .iter()
                .filter(|i| i.group == *group)
                .cloned()
                .collect();
            if items.is_empty() {
                None
            } else {
                Some(GroupSection { group: group.to_string(), items })
            }
        })
        .collect();

    MergedCatalog { sections }
}
