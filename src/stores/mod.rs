//! Stores: persistence, views and endpoints

pub mod api;
pub mod models;
pub mod store_repo;

pub use store_repo::{StoreError, StoreRepo};
