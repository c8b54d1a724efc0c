//! Admin: dashboard counts, account and store management

pub mod api;
pub mod queries;

pub use queries::{DashboardCounts, DashboardQueries};
