//! User Storage
//! Account persistence on top of the shared SQLite database

use crate::auth::models::{Account, Credentials, NewAccount, OwnerSummary, Role};
use crate::db::{is_unique_violation, Database};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

const ACCOUNT_COLUMNS: &str = "id, name, email, address, role";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let role: String = row.get(4)?;
    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        address: row.get(3)?,
        role,
    })
}

/// Account storage
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Look up an account with its stored password, for login
    pub fn find_by_email(&self, email: &str) -> Result<Option<Credentials>> {
        let conn = self.db.lock();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS}, password FROM users WHERE email = ?1"),
            params![email],
            |row| {
                Ok(Credentials {
                    account: account_from_row(row)?,
                    password: row.get(5)?,
                })
            },
        )
        .optional()
        .context("Failed to look up account by email")
    }

    /// Account projection without the password
    pub fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.db.lock();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            account_from_row,
        )
        .optional()
        .context("Failed to look up account by id")
    }

    /// Account with its stored password, for the password-change check
    pub fn find_credentials_by_id(&self, id: i64) -> Result<Option<Credentials>> {
        let conn = self.db.lock();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS}, password FROM users WHERE id = ?1"),
            params![id],
            |row| {
                Ok(Credentials {
                    account: account_from_row(row)?,
                    password: row.get(5)?,
                })
            },
        )
        .optional()
        .context("Failed to look up account credentials")
    }

    /// Insert a new account.
    ///
    /// The existence check and the insert run under one lock and one
    /// transaction; the UNIQUE constraint on `email` still decides the outcome.
    pub fn insert(&self, account: NewAccount) -> Result<i64, CredentialError> {
        let mut conn = self.db.lock();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        let taken: Option<i64> = tx
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![account.email],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to check email")?;
        if taken.is_some() {
            return Err(CredentialError::DuplicateEmail);
        }

        let inserted = tx.execute(
            "INSERT INTO users (name, email, password, address, role) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.name,
                account.email,
                account.password_hash,
                account.address,
                account.role.as_str(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(CredentialError::DuplicateEmail),
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert account").into()),
        }

        let id = tx.last_insert_rowid();
        tx.commit().context("Failed to commit account")?;

        info!(account_id = id, role = %account.role, "Created account");
        Ok(id)
    }

    /// Replace the stored password hash. Returns false if no such account.
    pub fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let conn = self.db.lock();
        let changed = conn
            .execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                params![password_hash, id],
            )
            .context("Failed to update password")?;
        Ok(changed > 0)
    }

    /// Swap a plaintext-stored password for its hash, only if the row still
    /// holds that plaintext. Returns whether a row changed.
    pub fn replace_legacy_password(
        &self,
        id: i64,
        legacy_plaintext: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let conn = self.db.lock();
        let changed = conn
            .execute(
                "UPDATE users SET password = ?1 WHERE id = ?2 AND password = ?3",
                params![password_hash, id, legacy_plaintext],
            )
            .context("Failed to replace legacy password")?;
        Ok(changed > 0)
    }

    /// List accounts, optionally restricted to one role
    pub fn list(&self, role: Option<Role>) -> Result<Vec<Account>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE (?1 IS NULL OR role = ?1) ORDER BY id ASC"
        ))?;

        let accounts = stmt
            .query_map(params![role.map(|r| r.as_str())], account_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list accounts")?;

        Ok(accounts)
    }

    pub fn list_owners(&self) -> Result<Vec<OwnerSummary>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, email FROM users WHERE role = 'owner' ORDER BY id ASC",
        )?;

        let owners = stmt
            .query_map([], |row| {
                Ok(OwnerSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list owners")?;

        Ok(owners)
    }
}
