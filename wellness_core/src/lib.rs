#![forbid(unsafe_code)]

//! Core domain model and analytics for the wellness tracker.
//!
//! This crate provides:
//! - Domain types (score inputs, body metrics, workouts, medication windows)
//! - Daily score calculation
//! - Linear trend projection for body composition
//! - Personal record prediction
//! - Medication fasting/restriction windows
//! - File-backed history (CSV metrics, JSONL workout journal)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod score;
pub mod trend;
pub mod prediction;
pub mod medication;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, PredictionConfig, ScoringConfig, TrendConfig};
pub use score::{compute_daily_score, score_breakdown};
pub use trend::{fit_linear, project_trend, LinearFit};
pub use prediction::{flatten_sets, normalize_exercise_name, predict_next_prs};
pub use medication::calculate_window;
pub use history::{append_body_metric, append_workout, FileHistory, HistorySource};
