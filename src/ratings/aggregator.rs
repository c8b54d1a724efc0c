//! Rating Aggregator
//!
//! Average computation, per-caller rating lookups and rating writes.
//! Averages are rounded to one decimal in SQL and reported as 0 for stores
//! without ratings. At most one rating exists per (user, store): the
//! pre-check gives the friendly error, the UNIQUE constraint guarantees it.

use crate::db::{is_unique_violation, Database};
use crate::stores::models::{StoreSummary, StoreWithCallerRating, StoreWithOwner};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("rating {0} outside 1..=5")]
    OutOfRange(i64),
    #[error("store not found")]
    StoreNotFound,
    #[error("store already rated by this user")]
    AlreadyRated,
    /// Rating does not exist or belongs to someone else; deliberately not distinguished
    #[error("not allowed")]
    Forbidden,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// One rating received by an owner's store
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OwnerStoreRating {
    pub id: i64,
    pub user_name: String,
    pub rating: i64,
}

fn check_range(value: i64) -> Result<(), RatingError> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(RatingError::OutOfRange(value))
    }
}

// Columns 0..=4: id, name, store_email, address, average_rating
fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<StoreSummary> {
    Ok(StoreSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        store_email: row.get(2)?,
        address: row.get(3)?,
        average_rating: row.get(4)?,
    })
}

pub struct RatingAggregator {
    db: Database,
}

impl RatingAggregator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Mean rating of one store, one decimal; 0 when it has no ratings
    pub fn average_for_store(&self, store_id: i64) -> Result<f64> {
        let conn = self.db.lock();
        conn.query_row(
            "SELECT IFNULL(ROUND(AVG(rating), 1), 0) FROM ratings WHERE store_id = ?1",
            params![store_id],
            |row| row.get(0),
        )
        .context("Failed to compute store average")
    }

    /// Every store with its average, by id ascending
    pub fn all_stores_with_average(&self) -> Result<Vec<StoreSummary>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT s.id, s.name, s.email, s.address,
                    IFNULL(ROUND(AVG(r.rating), 1), 0)
             FROM stores s
             LEFT JOIN ratings r ON r.store_id = s.id
             GROUP BY s.id
             ORDER BY s.id ASC",
        )?;

        let stores = stmt
            .query_map([], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list stores")?;
        Ok(stores)
    }

    /// Every store with owner email and average, for administrators
    pub fn stores_with_owner(&self) -> Result<Vec<StoreWithOwner>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT s.id, s.name, s.email, s.address,
                    IFNULL(ROUND(AVG(r.rating), 1), 0),
                    u.email
             FROM stores s
             LEFT JOIN users u ON s.owner_id = u.id
             LEFT JOIN ratings r ON r.store_id = s.id
             GROUP BY s.id
             ORDER BY s.id ASC",
        )?;

        let stores = stmt
            .query_map([], |row| {
                Ok(StoreWithOwner {
                    store: summary_from_row(row)?,
                    owner_email: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list stores with owners")?;
        Ok(stores)
    }

    /// Every store with its average and the caller's own rating, if any
    pub fn stores_with_caller_rating(
        &self,
        user_id: i64,
    ) -> Result<Vec<StoreWithCallerRating>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT s.id, s.name, s.email, s.address,
                    IFNULL(ROUND(AVG(r.rating), 1), 0),
                    (SELECT own.rating FROM ratings own
                     WHERE own.user_id = ?1 AND own.store_id = s.id)
             FROM stores s
             LEFT JOIN ratings r ON r.store_id = s.id
             GROUP BY s.id
             ORDER BY s.id ASC",
        )?;

        let stores = stmt
            .query_map(params![user_id], |row| {
                Ok(StoreWithCallerRating {
                    store: summary_from_row(row)?,
                    user_rating: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list stores for caller")?;
        Ok(stores)
    }

    /// Stores owned by `owner_id`, with averages
    pub fn owned_stores_with_average(&self, owner_id: i64) -> Result<Vec<StoreSummary>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT s.id, s.name, s.email, s.address,
                    IFNULL(ROUND(AVG(r.rating), 1), 0)
             FROM stores s
             LEFT JOIN ratings r ON r.store_id = s.id
             WHERE s.owner_id = ?1
             GROUP BY s.id
             ORDER BY s.id ASC",
        )?;

        let stores = stmt
            .query_map(params![owner_id], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list owned stores")?;
        Ok(stores)
    }

    /// Record a new rating. A second rating for the same store is refused.
    pub fn submit(&self, user_id: i64, store_id: i64, value: i64) -> Result<i64, RatingError> {
        check_range(value)?;

        let mut conn = self.db.lock();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        let store: Option<i64> = tx
            .query_row("SELECT id FROM stores WHERE id = ?1", params![store_id], |row| {
                row.get(0)
            })
            .optional()
            .context("Failed to look up store")?;
        if store.is_none() {
            return Err(RatingError::StoreNotFound);
        }

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM ratings WHERE user_id = ?1 AND store_id = ?2",
                params![user_id, store_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to check existing rating")?;
        if let Some(rating_id) = existing {
            debug!(user_id, store_id, rating_id, "Duplicate rating refused");
            return Err(RatingError::AlreadyRated);
        }

        let inserted = tx.execute(
            "INSERT INTO ratings (user_id, store_id, rating) VALUES (?1, ?2, ?3)",
            params![user_id, store_id, value],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(RatingError::AlreadyRated),
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert rating").into()),
        }

        let rating_id = tx.last_insert_rowid();
        tx.commit().context("Failed to commit rating")?;

        info!(user_id, store_id, rating_id, value, "Rating submitted");
        Ok(rating_id)
    }

    /// Change the value of a rating the caller authored
    pub fn update(&self, rating_id: i64, user_id: i64, value: i64) -> Result<(), RatingError> {
        check_range(value)?;

        let conn = self.db.lock();
        let changed = conn
            .execute(
                "UPDATE ratings SET rating = ?1 WHERE id = ?2 AND user_id = ?3",
                params![value, rating_id, user_id],
            )
            .context("Failed to update rating")?;

        if changed == 0 {
            debug!(user_id, rating_id, "Rating update denied");
            return Err(RatingError::Forbidden);
        }

        info!(user_id, rating_id, value, "Rating updated");
        Ok(())
    }

    /// Ratings on every store owned by `owner_id`, with the rater's name
    pub fn ratings_for_owner_store(&self, owner_id: i64) -> Result<Vec<OwnerStoreRating>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT r.id, u.name, r.rating
             FROM ratings r
             JOIN users u ON r.user_id = u.id
             JOIN stores s ON r.store_id = s.id
             WHERE s.owner_id = ?1
             ORDER BY r.id ASC",
        )?;

        let ratings = stmt
            .query_map(params![owner_id], |row| {
                Ok(OwnerStoreRating {
                    id: row.get(0)?,
                    user_name: row.get(1)?,
                    rating: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list owner ratings")?;
        Ok(ratings)
    }

    /// Mean over all ratings of all stores owned by `owner_id`, one decimal
    /// with the same rounding as the store averages; 0 if none
    pub fn owner_average(&self, owner_id: i64) -> Result<f64> {
        let conn = self.db.lock();
        conn.query_row(
            "SELECT IFNULL(ROUND(AVG(r.rating), 1), 0)
             FROM ratings r
             JOIN stores s ON r.store_id = s.id
             WHERE s.owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )
        .context("Failed to compute owner average")
    }
}
