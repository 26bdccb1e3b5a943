//! Stacklinks Core - relevance-ranked search over a user's saved links
//!
//! The working set (every link and collection a user owns) is fetched once and
//! kept in memory. Each settled query ranks it with multi-field weighted fuzzy
//! matching; a debounced controller publishes the results.

pub mod candidate;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod database;
pub mod fields;
pub mod interface;
pub mod matching;
pub mod models;
pub mod ranking;
pub mod share;
mod store;
pub mod working_set;

#[cfg(test)]
mod test_utils;

pub use config::SearchConfig;
pub use controller::SearchController;
pub use dashboard::DashboardStats;
pub use interface::*;
pub use store::LinkStore;
pub use working_set::WorkingSet;
