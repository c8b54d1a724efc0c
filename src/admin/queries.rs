//! Platform-wide counts for the admin dashboard

use crate::db::Database;
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DashboardCounts {
    pub users: i64,
    pub stores: i64,
    pub ratings: i64,
}

pub struct DashboardQueries {
    db: Database,
}

impl DashboardQueries {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Three independent counts, no snapshot across them
    pub fn counts(&self) -> Result<DashboardCounts> {
        Ok(DashboardCounts {
            users: self.count("users")?,
            stores: self.count("stores")?,
            ratings: self.count("ratings")?,
        })
    }

    fn count(&self, table: &'static str) -> Result<i64> {
        let conn = self.db.lock();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .with_context(|| format!("Failed to count {table}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let db = Database::open_in_memory().unwrap();
        let queries = DashboardQueries::new(db.clone());

        assert_eq!(
            queries.counts().unwrap(),
            DashboardCounts {
                users: 0,
                stores: 0,
                ratings: 0
            }
        );

        db.lock()
            .execute_batch(
                "INSERT INTO users (id, name, email, password, role) VALUES
                    (1, 'Ann Lee', 'ann@x.com', 'x', 'user'),
                    (2, 'Olive Owner', 'olive@x.com', 'x', 'owner');
                 INSERT INTO stores (id, name, email, address, owner_id) VALUES
                    (1, 'Alpha', 'alpha@x.com', '', 2);
                 INSERT INTO ratings (user_id, store_id, rating) VALUES (1, 1, 4);",
            )
            .unwrap();

        assert_eq!(
            queries.counts().unwrap(),
            DashboardCounts {
                users: 2,
                stores: 1,
                ratings: 1
            }
        );
    }
}
