//! Authentication Module
//! Credentials, password verification, JWT tokens and role-gated access

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod user_store;
pub mod validation;

pub use jwt::JwtHandler;
pub use middleware::{access_guard, AccessGuard};
pub use models::{Identity, Role, RoleSet};
pub use password::PasswordHasher;
pub use user_store::UserStore;
