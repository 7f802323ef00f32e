//! Picker state machine: grouped/filtered view, exact-match detection and
//! the add-custom workflow.
//!
//! `Closed → Open → (Closed | AddingCustom) → Closed`. The controller only
//! suspends around store calls; view computation is pure and synchronous.
//! It owns the transient view state (query, pending group) and never
//! mutates persisted data except through `CustomEntryStore`.

use serde::Serialize;

use crate::merge::{merge, GroupSection, MergedCatalog};
use crate::store::{CustomEntryStore, RemoteBackend};
use crate::taxonomy::{CatalogItem, Taxonomy, CUSTOM_GROUP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    Closed,
    Open,
    AddingCustom,
}

/// What the picker hands back on selection or a confirmed custom add.
/// `name: None` means the global/multi-region sentinel was selected:
/// no specific location, applies globally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commit {
    pub name: Option<String>,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// The grouped, filtered view plus the two decisions presentation needs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectorView {
    pub sections: Vec<GroupSection>,
    #[serde(rename = "hasExactMatch")]
    pub has_exact_match: bool,
    #[serde(rename = "offerAddCustom")]
    pub offer_add_custom: bool,
}

pub struct SelectorController<R: RemoteBackend> {
    taxonomy: &'static Taxonomy,
    store: CustomEntryStore<R>,
    user_id: Option<String>,
    on_commit: Box<dyn FnMut(Commit) + Send>,
    state: SelectorState,
    query: String,
    pending_group: String,
    catalog: MergedCatalog,
}

impl<R: RemoteBackend> SelectorController<R> {
    /// `user_id: None` puts the picker in taxonomy-only mode: custom
    /// entries are neither listed nor persisted, and confirmed adds are
    /// only notified (ephemeral for the session).
    pub fn new(
        taxonomy: &'static Taxonomy,
        store: CustomEntryStore<R>,
        user_id: Option<String>,
        on_commit: Box<dyn FnMut(Commit) + Send>,
    ) -> Self {
        Self {
            taxonomy,
            store,
            user_id,
            on_commit,
            state: SelectorState::Closed,
            query: String::new(),
            pending_group: CUSTOM_GROUP.to_string(),
            catalog: MergedCatalog::default(),
        }
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn pending_group(&self) -> &str {
        &self.pending_group
    }

    /// Open the picker: fetch the user's entries, merge, empty query.
    pub async fn activate(&mut self) {
        self.refresh().await;
        self.query.clear();
        self.state = SelectorState::Open;
    }

    pub fn set_query(&mut self, text: &str) {
        if self.state == SelectorState::Closed {
            return;
        }
        self.query = text.to_string();
    }

    /// Close the picker without selecting. An in-flight save is not
    /// aborted by this; its catalog refresh still lands so a later
    /// re-open reflects the saved entry.
    pub fn dismiss(&mut self) {
        self.state = SelectorState::Closed;
        self.query.clear();
        self.pending_group = CUSTOM_GROUP.to_string();
    }

    /// The grouped/filtered view for the current query. Empty when Closed.
    pub fn view(&self) -> SelectorView {
        if self.state == SelectorState::Closed {
            return SelectorView::default();
        }

        let q = self.query.trim().to_lowercase();
        let mut sections = Vec::new();

        // The location domain's sentinel group, shown on an empty query or
        // when the query looks like "global"/"multi-region".
        if let Some(opt) = self.taxonomy.global_option() {
            if opt.matches_query(&self.query) {
                sections.push(GroupSection {
                    group: opt.group.to_string(),
                    items: vec![opt.item()],
                });
            }
        }

        for section in &self.catalog.sections {
            if q.is_empty() {
                sections.push(section.clone());
                continue;
            }
            let items: Vec<CatalogItem> = section
                .items
                .iter()
                .filter(|i| i.name.to_lowercase().contains(&q))
                .cloned()
                .collect();
            if !items.is_empty() {
                sections.push(GroupSection { group: section.group.clone(), items });
            }
        }

        let has_exact_match = self.has_exact_match(&q);
        SelectorView {
            sections,
            has_exact_match,
            offer_add_custom: !q.is_empty() && !has_exact_match,
        }
    }

    fn has_exact_match(&self, query_lower: &str) -> bool {
        if query_lower.is_empty() {
            return false;
        }
        if self
            .catalog
            .items()
            .any(|i| i.name.to_lowercase() == query_lower)
        {
            return true;
        }
        match self.taxonomy.global_option() {
            Some(opt) => opt.label.to_lowercase() == query_lower,
            None => false,
        }
    }

    /// Select an existing item (or the global sentinel) and close.
    pub fn select(&mut self, item: &CatalogItem) {
        if self.state != SelectorState::Open {
            return;
        }
        let commit = match self.taxonomy.global_option() {
            Some(opt) if item.group == opt.group => Commit {
                name: None,
                group: opt.group.to_string(),
                code: None,
            },
            _ => Commit {
                name: Some(item.name.clone()),
                group: item.group.clone(),
                code: item.code.clone(),
            },
        };
        self.dismiss();
        (self.on_commit)(commit);
    }

    /// Take the "add as custom" affordance. Only valid while it is
    /// actually offered; the pending group defaults to Custom.
    pub fn begin_add_custom(&mut self) {
        if self.state != SelectorState::Open || !self.view().offer_add_custom {
            return;
        }
        self.pending_group = CUSTOM_GROUP.to_string();
        self.state = SelectorState::AddingCustom;
    }

    /// Pick the group the new entry files under. Unknown groups (and the
    /// non-filterable global sentinel, which is not in the group list)
    /// are ignored.
    pub fn set_custom_group(&mut self, group: &str) {
        if self.state != SelectorState::AddingCustom {
            return;
        }
        if self.taxonomy.is_valid_group(group) {
            self.pending_group = group.to_string();
        }
    }

    /// Persist the pending custom entry, fold it back into the catalog
    /// and close. Whitespace-only input is a no-op back to Open.
    pub async fn confirm_add_custom(&mut self) {
        if self.state != SelectorState::AddingCustom {
            return;
        }

        let name = self.query.trim().to_string();
        if name.is_empty() {
            self.state = SelectorState::Open;
            return;
        }
        let group = self.pending_group.clone();

        if let Some(user_id) = self.user_id.clone() {
            self.store.save(&user_id, &name, &group).await;
            // Re-read rather than trusting the save's return value: the
            // duplicate and fallback paths both return None.
            self.refresh().await;
        }

        self.dismiss();
        (self.on_commit)(Commit { name: Some(name), group, code: None });
    }

    async fn refresh(&mut self) {
        let entries = match &self.user_id {
            Some(user_id) => self.store.list(user_id).await,
            None => Vec::new(),
        };
        self.catalog = merge(self.taxonomy, &entries);
    }
}
