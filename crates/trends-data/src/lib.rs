//! Data layer for Garmin Trends.
//!
//! Responsible for discovering and reading CSV exports, mapping them onto the
//! per-metric schemas, normalizing and aggregating them into monthly tables,
//! writing the cleaned tables, and the statistics run over them.

pub mod aggregator;
pub mod cleaner;
pub mod pipeline;
pub mod reader;
pub mod schema;
pub mod stats;
pub mod writer;

pub use trends_core as core;
