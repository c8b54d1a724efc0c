//! Store views and request bodies

use crate::auth::models::flexible_id;
use serde::{Deserialize, Serialize};

/// Store with its average rating (0 when unrated)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreSummary {
    pub id: i64,
    pub name: String,
    pub store_email: Option<String>,
    pub address: Option<String>,
    pub average_rating: f64,
}

/// Admin listing: store, owner email and average
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreWithOwner {
    #[serde(flatten)]
    pub store: StoreSummary,
    pub owner_email: Option<String>,
}

/// Store listing for a signed-in caller, with the caller's own rating if any
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreWithCallerRating {
    #[serde(flatten)]
    pub store: StoreSummary,
    pub user_rating: Option<i64>,
}

/// Store to be inserted
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub owner_id: i64,
}

/// Create-store request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "email")]
    pub store_email: String,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "flexible_id")]
    pub owner_id: Option<i64>,
}

/// `{ "message": ..., "id": ... }` returned on creation
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: i64,
}
