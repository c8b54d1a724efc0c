//! Store Rating Backend Library
//!
//! Accounts with roles, stores, and 1-5 star ratings served over a JSON API.
//! The binary in `main.rs` only loads configuration and serves [`build_router`].

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod owner;
pub mod ratings;
pub mod stores;

use crate::admin::DashboardQueries;
use crate::auth::{access_guard, AccessGuard, JwtHandler, PasswordHasher, RoleSet, UserStore};
use crate::db::Database;
use crate::ratings::RatingAggregator;
use crate::stores::StoreRepo;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub stores: Arc<StoreRepo>,
    pub ratings: Arc<RatingAggregator>,
    pub dashboard: Arc<DashboardQueries>,
    pub passwords: Arc<PasswordHasher>,
    pub jwt: Arc<JwtHandler>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtHandler, passwords: PasswordHasher) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            stores: Arc::new(StoreRepo::new(db.clone())),
            ratings: Arc::new(RatingAggregator::new(db.clone())),
            dashboard: Arc::new(DashboardQueries::new(db)),
            passwords: Arc::new(passwords),
            jwt: Arc::new(jwt),
        }
    }

    fn guard(&self, allowed: RoleSet) -> AccessGuard {
        AccessGuard::new(self.jwt.clone(), allowed)
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Assemble every route. Each protected group carries its own role guard.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::api::register))
        .route("/api/auth/login", post(auth::api::login));

    let signed_in_routes = Router::new()
        .route("/api/auth/update-password", post(auth::api::update_password))
        .route("/api/auth/me", get(auth::api::me))
        .route("/api/stores", get(stores::api::list_stores))
        .route("/api/stores/user-list", get(stores::api::list_stores_for_user))
        .route_layer(from_fn_with_state(state.guard(RoleSet::ANY), access_guard));

    let admin_routes = Router::new()
        .route("/api/admin/dashboard", get(admin::api::dashboard))
        .route("/api/admin/users", get(admin::api::list_users))
        .route("/api/admin/users/:id", get(admin::api::user_detail))
        .route("/api/admin/owners", get(admin::api::list_owners))
        .route("/api/admin/stores", get(admin::api::list_stores))
        .route("/api/admin/add-user", post(admin::api::add_user))
        .route("/api/admin/add-store", post(stores::api::create_store))
        .route("/api/stores/create", post(stores::api::create_store))
        .route_layer(from_fn_with_state(state.guard(RoleSet::ADMIN), access_guard));

    let user_routes = Router::new()
        .route("/api/ratings", post(ratings::api::submit_rating))
        .route("/api/ratings/:id", patch(ratings::api::update_rating))
        .route_layer(from_fn_with_state(state.guard(RoleSet::USER), access_guard));

    let owner_routes = Router::new()
        .route("/api/owner/my-store", get(owner::my_store_ratings))
        .route("/api/owner/my-store/average", get(owner::my_store_average))
        .route_layer(from_fn_with_state(state.guard(RoleSet::OWNER), access_guard));

    Router::new()
        .merge(public_routes)
        .merge(signed_in_routes)
        .merge(admin_routes)
        .merge(user_routes)
        .merge(owner_routes)
        .with_state(state)
        .layer(from_fn(middleware::request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
