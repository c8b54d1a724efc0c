//! Ratings: aggregation queries and the user-facing rating endpoints

pub mod aggregator;
pub mod api;

pub use aggregator::{RatingAggregator, RatingError};
