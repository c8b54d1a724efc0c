//! Admin endpoints (role `admin`)

use crate::admin::queries::DashboardCounts;
use crate::auth::api::{create_account, AccountInput};
use crate::auth::models::{Account, OwnerSummary, Role};
use crate::error::{run_blocking, ApiError, JsonBody, PathParam};
use crate::stores::models::{CreatedResponse, StoreSummary, StoreWithOwner};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub address: Option<String>,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub user: Account,
    /// Owned stores with averages; always empty for non-owners
    pub stores: Vec<StoreSummary>,
}

/// GET /api/admin/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardCounts>, ApiError> {
    let dashboard = state.dashboard.clone();
    let counts = run_blocking(move || dashboard.counts()).await?;
    Ok(Json(counts))
}

/// GET /api/admin/users?role=
pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let role = match filter.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(r) => Some(
            r.parse::<Role>()
                .map_err(|e| ApiError::validation(format!("Invalid role: {}", e.0)))?,
        ),
    };

    let users = state.users.clone();
    let accounts = run_blocking(move || users.list(role)).await?;
    Ok(Json(accounts))
}

/// GET /api/admin/owners
pub async fn list_owners(
    State(state): State<AppState>,
) -> Result<Json<Vec<OwnerSummary>>, ApiError> {
    let users = state.users.clone();
    let owners = run_blocking(move || users.list_owners()).await?;
    Ok(Json(owners))
}

/// GET /api/admin/stores
pub async fn list_stores(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoreWithOwner>>, ApiError> {
    let ratings = state.ratings.clone();
    let stores = run_blocking(move || ratings.stores_with_owner()).await?;
    Ok(Json(stores))
}

/// POST /api/admin/add-user
pub async fn add_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AddUserRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    if payload.name.is_empty()
        || payload.email.is_empty()
        || payload.password.is_empty()
        || payload.role.trim().is_empty()
    {
        return Err(ApiError::validation("All fields required"));
    }
    let role = payload
        .role
        .trim()
        .parse::<Role>()
        .map_err(|e| ApiError::validation(format!("Invalid role: {}", e.0)))?;

    let id = create_account(
        &state,
        AccountInput {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            address: payload.address,
            role,
        },
    )
    .await?;

    info!(account_id = id, role = %role, "Admin created account");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "User created",
            id,
        }),
    ))
}

/// GET /api/admin/users/:id
pub async fn user_detail(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<UserDetail>, ApiError> {
    let users = state.users.clone();
    let ratings = state.ratings.clone();

    let detail = run_blocking(move || -> Result<UserDetail, ApiError> {
        let user = users
            .find_by_id(id)?
            .ok_or(ApiError::NotFound("User not found"))?;

        let stores = match user.role {
            Role::Owner => ratings.owned_stores_with_average(user.id)?,
            Role::Admin | Role::User => Vec::new(),
        };
        Ok(UserDetail { user, stores })
    })
    .await?;

    Ok(Json(detail))
}
