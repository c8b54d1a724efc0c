//! Store persistence

use crate::db::Database;
use crate::stores::models::NewStore;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced account does not exist or is not an owner
    #[error("owner not found or not an owner account")]
    OwnerNotFound,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct StoreRepo {
    db: Database,
}

impl StoreRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a store linked to an owner account.
    /// Nothing is written unless `owner_id` names an account with role `owner`.
    pub fn create(&self, store: NewStore) -> Result<i64, StoreError> {
        let mut conn = self.db.lock();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        let owner: Option<i64> = tx
            .query_row(
                "SELECT id FROM users WHERE id = ?1 AND role = 'owner'",
                params![store.owner_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to look up owner")?;
        if owner.is_none() {
            return Err(StoreError::OwnerNotFound);
        }

        tx.execute(
            "INSERT INTO stores (name, email, address, owner_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                store.name,
                store.email,
                store.address.as_deref().unwrap_or(""),
                store.owner_id
            ],
        )
        .context("Failed to insert store")?;

        let id = tx.last_insert_rowid();
        tx.commit().context("Failed to commit store")?;

        info!(store_id = id, owner_id = store.owner_id, "Created store");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, StoreRepo) {
        let db = Database::open_in_memory().unwrap();
        {
            let conn = db.lock();
            conn.execute_batch(
                "INSERT INTO users (id, name, email, password, role) VALUES (1, 'Olive Owner', 'o@x.com', 'x', 'owner');
                 INSERT INTO users (id, name, email, password, role) VALUES (2, 'Uma User', 'u@x.com', 'x', 'user');",
            )
            .unwrap();
        }
        let repo = StoreRepo::new(db.clone());
        (db, repo)
    }

    fn new_store(owner_id: i64) -> NewStore {
        NewStore {
            name: "ZNW Store".to_string(),
            email: "znw@x.com".to_string(),
            address: None,
            owner_id,
        }
    }

    #[test]
    fn test_create_store_with_owner() {
        let (db, repo) = setup();
        let id = repo.create(new_store(1)).unwrap();

        let (name, address, owner_id): (String, String, i64) = db
            .lock()
            .query_row(
                "SELECT name, address, owner_id FROM stores WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(name, "ZNW Store");
        assert_eq!(address, "");
        assert_eq!(owner_id, 1);
    }

    #[test]
    fn test_non_owner_rejected_without_insert() {
        let (db, repo) = setup();

        let err = repo.create(new_store(2)).unwrap_err();
        assert!(matches!(err, StoreError::OwnerNotFound));

        let err = repo.create(new_store(99)).unwrap_err();
        assert!(matches!(err, StoreError::OwnerNotFound));

        let count: i64 = db
            .lock()
            .query_row("SELECT COUNT(*) FROM stores", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
