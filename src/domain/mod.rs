//! Core domain types and logic: the price book, team holdings, valuation and
//! settlement.

pub mod config_validation;
pub mod desk;
pub mod error;
pub mod holdings;
pub mod instrument;
pub mod leaderboard;
pub mod money;
pub mod price_book;
pub mod settlement;
pub mod team;
pub mod valuation;
