//! Rating endpoints (role `user`)

use crate::auth::models::{flexible_id, Identity, MessageResponse};
use crate::error::{run_blocking, ApiError, JsonBody, PathParam};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    #[serde(default, alias = "store_id", deserialize_with = "flexible_id")]
    pub store_id: Option<i64>,
    #[serde(default, deserialize_with = "flexible_id")]
    pub rating: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    #[serde(default, deserialize_with = "flexible_id")]
    pub rating: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubmitRatingResponse {
    pub message: &'static str,
    pub rating_id: i64,
}

/// POST /api/ratings
pub async fn submit_rating(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(payload): JsonBody<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<SubmitRatingResponse>), ApiError> {
    let (Some(store_id), Some(rating)) = (payload.store_id, payload.rating) else {
        return Err(ApiError::validation("storeId and rating are required"));
    };

    let ratings = state.ratings.clone();
    let rating_id = run_blocking(move || ratings.submit(identity.id, store_id, rating)).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRatingResponse {
            message: "Rating submitted",
            rating_id,
        }),
    ))
}

/// PATCH /api/ratings/:id
pub async fn update_rating(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParam(rating_id): PathParam<i64>,
    JsonBody(payload): JsonBody<UpdateRatingRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let rating = payload
        .rating
        .ok_or_else(|| ApiError::validation("rating is required"))?;

    let ratings = state.ratings.clone();
    run_blocking(move || ratings.update(rating_id, identity.id, rating)).await?;

    Ok(Json(MessageResponse {
        message: "Rating updated",
    }))
}
