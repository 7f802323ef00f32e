//! Remote store client for custom entries.
//!
//! Speaks a PostgREST-style JSON API, one table per domain
//! (`custom_organizations`, `custom_locations`). The only failure the rest
//! of the store treats specially is the duplicate-key rejection; everything
//! else is "unavailable" and triggers the local-cache fallback.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use super::CustomEntry;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote rejected an insert because a record for the same
    /// `(user_id, name)` already exists.
    #[error("duplicate entry for this user and name")]
    Duplicate,
    /// Network failure, auth failure, schema mismatch — anything that
    /// isn't specifically the uniqueness violation.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

/// Remote persistence operations, abstracted so tests can script outcomes.
pub trait RemoteBackend: Send + Sync {
    /// All entries for a user, ordered by name.
    fn list(&self, user_id: &str) -> impl Future<Output = Result<Vec<CustomEntry>, RemoteError>> + Send;
    /// Insert a new entry; `Err(Duplicate)` if `(user_id, name)` exists.
    fn insert(&self, entry: &CustomEntry) -> impl Future<Output = Result<CustomEntry, RemoteError>> + Send;
    /// Rewrite group/updated_at of the existing `(user_id, name)` record.
    fn update(
        &self,
        user_id: &str,
        name: &str,
        group: &str,
        updated_at: i64,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Wire row matching the remote table columns.
#[derive(Debug, Serialize, Deserialize)]
struct RawEntry {
    id: String,
    user_id: String,
    name: String,
    group_name: String,
    created_at: i64,
    updated_at: i64,
}

impl RawEntry {
    fn from_entry(entry: &CustomEntry) -> Self {
        Self {
            id: entry.id.clone(),
            user_id: entry.user_id.clone(),
            name: entry.name.clone(),
            group_name: entry.group.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }

    fn into_entry(self) -> CustomEntry {
        CustomEntry {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            group: self.group_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub struct HttpRemote {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    table: String,
}

impl HttpRemote {
    /// `base_url` is the API root (e.g. `https://db.example.com/rest/v1`),
    /// `domain` picks the table (`custom_{domain}`).
    pub fn new(base_url: &str, api_key: Option<String>, domain: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table: format!("custom_{}", domain),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.base_url, self.table)
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key)),
            None => req,
        }
    }
}

/// Map a failed write response onto the error classification. Only an
/// HTTP 409 whose body carries the Postgres unique-violation code (23505)
/// or names a duplicate/unique constraint selects the update path; an
/// ambiguous conflict is treated as unavailability so the write lands in
/// the local cache instead of being misdirected.
fn classify_write_failure(status: StatusCode, body: &str) -> RemoteError {
    if status == StatusCode::CONFLICT {
        let lower = body.to_lowercase();
        if lower.contains("23505")
            || lower.contains("duplicate key")
            || lower.contains("unique constraint")
        {
            return RemoteError::Duplicate;
        }
    }
    RemoteError::Unavailable(format!("remote returned {}: {}", status, body))
}

/// Case-insensitive name lookup, matching the uniqueness constraint.
/// Exact equality only: wildcard characters in a name mean themselves.
fn find_by_name<'a>(rows: &'a [CustomEntry], name: &str) -> Option<&'a CustomEntry> {
    let lower = name.to_lowercase();
    rows.iter().find(|e| e.name.to_lowercase() == lower)
}

impl RemoteBackend for HttpRemote {
    async fn list(&self, user_id: &str) -> Result<Vec<CustomEntry>, RemoteError> {
        let url = format!(
            "{}?user_id=eq.{}&order=name.asc",
            self.table_url(),
            urlencoding::encode(user_id)
        );

        let resp = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("list request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Unavailable(format!(
                "remote returned {}: {}",
                status, body
            )));
        }

        let rows: Vec<RawEntry> = resp
            .json()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("list response unreadable: {}", e)))?;
        Ok(rows.into_iter().map(RawEntry::into_entry).collect())
    }

    async fn insert(&self, entry: &CustomEntry) -> Result<CustomEntry, RemoteError> {
        let resp = self
            .with_auth(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&vec![RawEntry::from_entry(entry)])
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("insert request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_write_failure(status, &body));
        }

        let mut rows: Vec<RawEntry> = resp
            .json()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("insert response unreadable: {}", e)))?;
        match rows.pop() {
            Some(row) => Ok(row.into_entry()),
            None => Err(RemoteError::Unavailable(
                "insert returned no representation".to_string(),
            )),
        }
    }

    async fn update(
        &self,
        user_id: &str,
        name: &str,
        group: &str,
        updated_at: i64,
    ) -> Result<(), RemoteError> {
        // Resolve the row first and patch by id. A LIKE-style name filter
        // would treat '%'/'_' in the name as wildcards and could rewrite
        // sibling rows ("my_team" must never touch "my team").
        let rows = self.list(user_id).await?;
        let target = find_by_name(&rows, name).ok_or_else(|| {
            RemoteError::Unavailable(format!("no record named '{}' to update", name))
        })?;
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(),
            urlencoding::encode(&target.id)
        );

        let resp = self
            .with_auth(self.client.patch(&url))
            .json(&serde_json::json!({ "group_name": group, "updated_at": updated_at }))
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("update request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Unavailable(format!(
                "remote returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_with_postgres_code_is_duplicate() {
        let err = classify_write_failure(
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#,
        );
        assert!(matches!(err, RemoteError::Duplicate));
    }

    #[test]
    fn test_bare_conflict_is_not_duplicate() {
        let err = classify_write_failure(StatusCode::CONFLICT, r#"{"message":"conflict"}"#);
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }

    #[test]
    fn test_server_error_is_unavailable() {
        let err = classify_write_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let rows = vec![
            CustomEntry::new("u1", "my team", "Custom"),
            CustomEntry::new("u1", "Acme2", "Technology"),
        ];
        assert_eq!(find_by_name(&rows, "MY TEAM").unwrap().name, "my team");
        assert_eq!(find_by_name(&rows, "acme2").unwrap().name, "Acme2");
        assert!(find_by_name(&rows, "acme").is_none());
    }

    #[test]
    fn test_find_by_name_treats_wildcard_characters_literally() {
        // Underscore and percent are SQL LIKE wildcards; the target row is
        // resolved here precisely so they never act as such.
        let rows = vec![
            CustomEntry::new("u1", "my_team", "Custom"),
            CustomEntry::new("u1", "my team", "Technology"),
            CustomEntry::new("u1", "100% Remote", "Custom"),
        ];
        assert_eq!(find_by_name(&rows, "my_team").unwrap().name, "my_team");
        assert_eq!(find_by_name(&rows, "my team").unwrap().name, "my team");
        assert_eq!(find_by_name(&rows, "100% remote").unwrap().name, "100% Remote");
        assert!(find_by_name(&rows, "my.team").is_none());
        assert!(find_by_name(&rows, "100_ Remote").is_none());
    }
}
