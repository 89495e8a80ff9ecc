//! Bearer token store backed by redb.
//!
//! One token per (account, provider), keyed `user:provider`. The upsert runs
//! in a single write transaction, so a re-login under a concurrent login for
//! the same pair always leaves exactly one row and never a duplicate.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// redb table for tokens (key: "user:provider", value: MessagePack bytes).
const TOKENS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("saml_tokens");

/// One bearer token row.
///
/// The value is the raw validated response payload and is a secret; it must
/// never appear in logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamlToken {
    pub user_id: Uuid,
    pub provider_id: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent token store.
pub struct TokenStore {
    db: Database,
}

impl TokenStore {
    /// Open or create a token store at the given path.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let db = Database::create(&path)
            .with_context(|| format!("Failed to open token database: {:?}", path))?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TOKENS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn key(user_id: Uuid, provider_id: &str) -> String {
        format!("{user_id}:{provider_id}")
    }

    /// Insert or refresh the token for an (account, provider) pair.
    ///
    /// The read-modify-write happens inside one write transaction: the
    /// original creation time survives a refresh, and concurrent logins for
    /// the same pair serialize on the transaction instead of racing.
    pub fn upsert(&self, user_id: Uuid, provider_id: &str, value: String) -> Result<SamlToken> {
        let key = Self::key(user_id, provider_id);
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let token = {
            let mut table = write_txn.open_table(TOKENS_TABLE)?;

            let created_at = match table.get(key.as_str())? {
                Some(existing) => {
                    let previous: SamlToken = rmp_serde::from_slice(existing.value())
                        .context("Failed to deserialize token")?;
                    previous.created_at
                }
                None => now,
            };

            let token = SamlToken {
                user_id,
                provider_id: provider_id.to_string(),
                value,
                created_at,
                updated_at: now,
            };
            let data = rmp_serde::to_vec(&token).context("Failed to serialize token")?;
            table.insert(key.as_str(), data.as_slice())?;
            token
        };
        write_txn.commit()?;

        debug!(user_id = %user_id, provider = %provider_id, "stored bearer token");
        Ok(token)
    }

    /// Fetch the token for an (account, provider) pair.
    pub fn get(&self, user_id: Uuid, provider_id: &str) -> Result<Option<SamlToken>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOKENS_TABLE)?;

        let key = Self::key(user_id, provider_id);
        match table.get(key.as_str())? {
            Some(value) => {
                let token: SamlToken = rmp_serde::from_slice(value.value())
                    .context("Failed to deserialize token")?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    /// Find a token row for an account by its exact value, whichever provider
    /// issued it.
    pub fn find_by_user_and_value(
        &self,
        user_id: Uuid,
        value: &str,
    ) -> Result<Option<SamlToken>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOKENS_TABLE)?;

        for entry in table.iter()? {
            let (_, row) = entry?;
            let token: SamlToken =
                rmp_serde::from_slice(row.value()).context("Failed to deserialize token")?;
            if token.user_id == user_id && token.value == value {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }

    /// Delete the token for an (account, provider) pair.
    pub fn delete(&self, user_id: Uuid, provider_id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(TOKENS_TABLE)?;
            let key = Self::key(user_id, provider_id);
            let removed = table.remove(key.as_str())?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Total number of stored tokens.
    pub fn token_count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOKENS_TABLE)?;
        Ok(table.len()? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn test_store() -> (TokenStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = TokenStore::open(dir.path().join("tokens.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn test_upsert_and_get() {
        let (store, _dir) = test_store();
        let user = Uuid::new_v4();

        store.upsert(user, "p1", "payload-1".to_string()).unwrap();
        let token = store.get(user, "p1").unwrap().unwrap();
        assert_eq!(token.value, "payload-1");
        assert!(store.get(user, "p2").unwrap().is_none());
    }

    #[test]
    fn test_upsert_overwrites_single_row() {
        let (store, _dir) = test_store();
        let user = Uuid::new_v4();

        let first = store.upsert(user, "p1", "payload-1".to_string()).unwrap();
        let second = store.upsert(user, "p1", "payload-2".to_string()).unwrap();

        assert_eq!(store.token_count().unwrap(), 1);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.get(user, "p1").unwrap().unwrap().value, "payload-2");
    }

    #[test]
    fn test_find_by_user_and_value_is_provider_agnostic() {
        let (store, _dir) = test_store();
        let user = Uuid::new_v4();

        store.upsert(user, "p1", "payload-a".to_string()).unwrap();
        store.upsert(user, "p2", "payload-b".to_string()).unwrap();
        store
            .upsert(Uuid::new_v4(), "p1", "payload-a".to_string())
            .unwrap();

        let hit = store.find_by_user_and_value(user, "payload-b").unwrap().unwrap();
        assert_eq!(hit.provider_id, "p2");

        // Same value under a different provider still matches.
        let hit = store.find_by_user_and_value(user, "payload-a").unwrap().unwrap();
        assert_eq!(hit.provider_id, "p1");

        assert!(store.find_by_user_and_value(user, "stale").unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let (store, _dir) = test_store();
        let user = Uuid::new_v4();

        store.upsert(user, "p1", "payload".to_string()).unwrap();
        assert!(store.delete(user, "p1").unwrap());
        assert!(!store.delete(user, "p1").unwrap());
        assert!(store.get(user, "p1").unwrap().is_none());
    }

    #[test]
    fn test_concurrent_upserts_leave_one_row() {
        let (store, _dir) = test_store();
        let store = Arc::new(store);
        let user = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.upsert(user, "p1", format!("payload-{i}")).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.token_count().unwrap(), 1);
    }
}
