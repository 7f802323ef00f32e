//! Per-user durable storage of custom catalog entries.
//!
//! Remote store first, local cache as the fallback. No operation here ever
//! fails outward: the picker's availability must not depend on remote
//! reachability, so failures degrade to the local cache (writes) or an
//! empty list (reads) and are only logged.

mod cache;
mod remote;

pub use cache::CacheDb;
pub use remote::{HttpRemote, RemoteBackend, RemoteError};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A user-submitted catalog entry. At most one exists per
/// `(user_id, name)` pair, case-insensitive on the name; resubmitting the
/// same name updates `group`/`updated_at` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEntry {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub group: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl CustomEntry {
    pub fn new(user_id: &str, name: &str, group: &str) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            group: group.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

pub struct CustomEntryStore<R: RemoteBackend> {
    domain: &'static str,
    remote: Option<R>,
    cache: Arc<CacheDb>,
}

impl<R: RemoteBackend> CustomEntryStore<R> {
    /// `remote: None` means no remote is configured; every operation goes
    /// straight to the local cache, same as when the remote is down.
    pub fn new(domain: &'static str, remote: Option<R>, cache: Arc<CacheDb>) -> Self {
        Self { domain, remote, cache }
    }

    fn cache_key(&self, user_id: &str) -> String {
        format!("{}:{}", self.domain, user_id)
    }

    /// All custom entries for a user, ordered by name. Never fails: any
    /// remote error falls back to the local cache, worst case empty.
    pub async fn list(&self, user_id: &str) -> Vec<CustomEntry> {
        if let Some(remote) = &self.remote {
            match remote.list(user_id).await {
                Ok(entries) => return entries,
                Err(e) => {
                    eprintln!("Custom entry list fell back to local cache: {}", e);
                }
            }
        }
        self.cached(user_id)
    }

    /// The locally-cached entries for a user, ordered by name.
    pub fn cached(&self, user_id: &str) -> Vec<CustomEntry> {
        let mut entries = self.cache.read(&self.cache_key(user_id));
        entries.sort_by_key(|e| e.name.to_lowercase());
        entries
    }

    /// Persist a new entry. Returns the persisted record only on a clean
    /// remote insert; the duplicate-update and local-fallback paths return
    /// `None` and the caller re-reads via `list` instead of trusting a
    /// stale record.
    pub async fn save(&self, user_id: &str, name: &str, group: &str) -> Option<CustomEntry> {
        let entry = CustomEntry::new(user_id, name, group);

        let Some(remote) = &self.remote else {
            self.upsert_local(entry);
            return None;
        };

        match remote.insert(&entry).await {
            Ok(saved) => Some(saved),
            Err(RemoteError::Duplicate) => {
                // Same (user, name) already exists: mutate its group
                // instead of creating a second record.
                self.update(user_id, name, group).await;
                None
            }
            Err(RemoteError::Unavailable(e)) => {
                eprintln!("Custom entry save fell back to local cache: {}", e);
                self.upsert_local(entry);
                None
            }
        }
    }

    /// Rewrite the group of the existing `(user_id, name)` record. Same
    /// remote-then-local policy as `save`, but never inserts remotely.
    pub async fn update(&self, user_id: &str, name: &str, group: &str) -> bool {
        let now = chrono::Utc::now().timestamp_millis();
        if let Some(remote) = &self.remote {
            match remote.update(user_id, name, group, now).await {
                Ok(()) => return true,
                Err(e) => {
                    eprintln!("Custom entry update fell back to local cache: {}", e);
                }
            }
        }
        self.upsert_local(CustomEntry::new(user_id, name, group))
    }

    /// Replace-by-name else append, then rewrite the user's whole list in
    /// one statement. Name matching is case-insensitive; an existing
    /// record keeps its id and created_at.
    fn upsert_local(&self, entry: CustomEntry) -> bool {
        let key = self.cache_key(&entry.user_id);
        let mut entries = self.cache.read(&key);

        let lower = entry.name.to_lowercase();
        match entries.iter_mut().find(|e| e.name.to_lowercase() == lower) {
            Some(existing) => {
                existing.group = entry.group;
                existing.updated_at = entry.updated_at;
            }
            None => entries.push(entry),
        }

        match self.cache.write(&key, &entries) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("Local cache write failed for {}: {}", key, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory remote honoring the (user_id, name) uniqueness constraint.
    #[derive(Default)]
    struct MockRemote {
        rows: Mutex<Vec<CustomEntry>>,
        down: bool,
    }

    impl MockRemote {
        fn offline() -> Self {
            Self { rows: Mutex::new(Vec::new()), down: true }
        }

        fn snapshot(&self) -> Vec<CustomEntry> {
            self.rows.lock().unwrap().clone()
        }
    }

    impl RemoteBackend for &MockRemote {
        async fn list(&self, user_id: &str) -> Result<Vec<CustomEntry>, RemoteError> {
            if self.down {
                return Err(RemoteError::Unavailable("connection refused".to_string()));
            }
            let mut rows: Vec<CustomEntry> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by_key(|e| e.name.to_lowercase());
            Ok(rows)
        }

        async fn insert(&self, entry: &CustomEntry) -> Result<CustomEntry, RemoteError> {
            if self.down {
                return Err(RemoteError::Unavailable("connection refused".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            let dup = rows.iter().any(|e| {
                e.user_id == entry.user_id && e.name.to_lowercase() == entry.name.to_lowercase()
            });
            if dup {
                return Err(RemoteError::Duplicate);
            }
            rows.push(entry.clone());
            Ok(entry.clone())
        }

        async fn update(
            &self,
            user_id: &str,
            name: &str,
            group: &str,
            updated_at: i64,
        ) -> Result<(), RemoteError> {
            if self.down {
                return Err(RemoteError::Unavailable("connection refused".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|e| e.user_id == user_id && e.name.to_lowercase() == name.to_lowercase())
                .ok_or_else(|| RemoteError::Unavailable("no such row".to_string()))?;
            row.group = group.to_string();
            row.updated_at = updated_at;
            Ok(())
        }
    }

    fn store<'a>(
        domain: &'static str,
        remote: &'a MockRemote,
    ) -> CustomEntryStore<&'a MockRemote> {
        CustomEntryStore::new(domain, Some(remote), Arc::new(CacheDb::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_save_then_list_roundtrip() {
        let remote = MockRemote::default();
        let store = store("organizations", &remote);

        let saved = store.save("u1", "Acme2", "Technology").await;
        assert_eq!(saved.as_ref().map(|e| e.name.as_str()), Some("Acme2"));

        let listed = store.list("u1").await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].group, "Technology");
    }

    #[tokio::test]
    async fn test_duplicate_save_updates_in_place() {
        let remote = MockRemote::default();
        let store = store("organizations", &remote);

        store.save("u1", "Acme2", "Technology").await.unwrap();
        let first = remote.snapshot()[0].clone();

        tokio::time::sleep(Duration::from_millis(5)).await;
        // Second save for the same name: no new row, group rewritten.
        let second = store.save("u1", "acme2", "Custom").await;
        assert!(second.is_none());

        let rows = remote.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, first.id);
        assert_eq!(rows[0].group, "Custom");
        assert!(rows[0].updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn test_outage_save_lands_in_cache_and_list_falls_back() {
        let remote = MockRemote::offline();
        let store = store("locations", &remote);

        assert!(store.save("u1", "Atlantis", "Custom").await.is_none());

        let listed = store.list("u1").await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Atlantis");
        assert!(remote.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_outage_resave_upserts_not_duplicates() {
        let remote = MockRemote::offline();
        let store = store("locations", &remote);

        store.save("u1", "Atlantis", "Custom").await;
        store.save("u1", "ATLANTIS", "Europe").await;

        let listed = store.list("u1").await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Atlantis");
        assert_eq!(listed[0].group, "Europe");
    }

    #[tokio::test]
    async fn test_no_remote_configured_uses_cache() {
        let store: CustomEntryStore<&MockRemote> =
            CustomEntryStore::new("organizations", None, Arc::new(CacheDb::in_memory().unwrap()));

        store.save("u1", "Initech", "Custom").await;
        assert!(store.update("u1", "Initech", "Technology").await);

        let listed = store.list("u1").await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].group, "Technology");
    }

    #[tokio::test]
    async fn test_cache_list_is_ordered_by_name() {
        let remote = MockRemote::offline();
        let store = store("organizations", &remote);

        store.save("u1", "zeta", "Custom").await;
        store.save("u1", "Alpha", "Custom").await;

        let names: Vec<String> = store.list("u1").await.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_users_and_domains_are_isolated() {
        let remote = MockRemote::offline();
        let cache = Arc::new(CacheDb::in_memory().unwrap());
        let orgs: CustomEntryStore<&MockRemote> =
            CustomEntryStore::new("organizations", Some(&remote), cache.clone());
        let locs: CustomEntryStore<&MockRemote> =
            CustomEntryStore::new("locations", Some(&remote), cache);

        orgs.save("u1", "Acme2", "Custom").await;
        assert!(locs.list("u1").await.is_empty());
        assert!(orgs.list("u2").await.is_empty());
        assert_eq!(orgs.list("u1").await.len(), 1);
    }
}
