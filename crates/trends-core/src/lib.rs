//! Shared types and normalization rules for Garmin Trends.
//!
//! Holds the error taxonomy, the record/table model, the date and value
//! normalizers, display formatting and the command-line settings.

pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod values;

pub use error::{Result, TrendsError};
