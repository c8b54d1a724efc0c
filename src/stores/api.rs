//! Store endpoints

use crate::auth::models::Identity;
use crate::auth::validation::validate_email;
use crate::error::{run_blocking, ApiError, JsonBody};
use crate::stores::models::{
    CreateStoreRequest, CreatedResponse, NewStore, StoreSummary, StoreWithCallerRating,
};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Extension, Json};

/// GET /api/stores - every store with its average rating
pub async fn list_stores(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoreSummary>>, ApiError> {
    let ratings = state.ratings.clone();
    let stores = run_blocking(move || ratings.all_stores_with_average()).await?;
    Ok(Json(stores))
}

/// GET /api/stores/user-list - stores with the caller's own rating
pub async fn list_stores_for_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<StoreWithCallerRating>>, ApiError> {
    let ratings = state.ratings.clone();
    let stores = run_blocking(move || ratings.stores_with_caller_rating(identity.id)).await?;
    Ok(Json(stores))
}

/// POST /api/stores/create and POST /api/admin/add-store (admin only)
pub async fn create_store(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateStoreRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let name = payload.name.trim();
    let owner_id = match payload.owner_id {
        Some(id) if !name.is_empty() && !payload.store_email.is_empty() => id,
        _ => return Err(ApiError::validation("Name, email and ownerId are required")),
    };
    validate_email(&payload.store_email).map_err(ApiError::validation)?;

    let store = NewStore {
        name: name.to_string(),
        email: payload.store_email,
        address: payload.address,
        owner_id,
    };
    let stores = state.stores.clone();
    let id = run_blocking(move || stores.create(store)).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Store created",
            id,
        }),
    ))
}
