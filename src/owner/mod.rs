//! Owner endpoints (role `owner`): feedback on the caller's own stores

use crate::auth::models::Identity;
use crate::error::{run_blocking, ApiError};
use crate::ratings::aggregator::OwnerStoreRating;
use crate::AppState;
use axum::{extract::State, Extension, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OwnerAverage {
    /// One decimal, as text ("0.0" without ratings)
    pub average_rating: String,
}

/// GET /api/owner/my-store
pub async fn my_store_ratings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<OwnerStoreRating>>, ApiError> {
    let ratings = state.ratings.clone();
    let received = run_blocking(move || ratings.ratings_for_owner_store(identity.id)).await?;
    Ok(Json(received))
}

/// GET /api/owner/my-store/average
pub async fn my_store_average(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<OwnerAverage>, ApiError> {
    let ratings = state.ratings.clone();
    let average = run_blocking(move || ratings.owner_average(identity.id)).await?;
    Ok(Json(OwnerAverage {
        average_rating: format_average(average),
    }))
}

fn format_average(average: f64) -> String {
    format!("{:.1}", average)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_average() {
        assert_eq!(format_average(0.0), "0.0");
        assert_eq!(format_average(4.0), "4.0");
        assert_eq!(format_average(2.3), "2.3");
        assert_eq!(format_average(11.0 / 3.0), "3.7");
    }
}
