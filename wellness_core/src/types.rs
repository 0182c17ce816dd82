//! Core domain types for the wellness analytics.
//!
//! This module defines the plain value types that flow between the
//! history repository and the calculators:
//! - Daily score inputs and breakdowns
//! - Body-composition samples and trend projections
//! - Workout/set records and PR predictions
//! - Medication schedule and window results

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Shared
// ============================================================================

/// How much a derived prediction should be trusted
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Inclusive calendar date filter used by history queries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn since(from: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

// ============================================================================
// Daily score
// ============================================================================

/// The four daily signals that feed the wellness score
///
/// Missing fields deserialize to zero/false and contribute nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DailyScoreInput {
    pub workout_completed: bool,
    /// Fraction of the nutrition target met, 0..=1
    pub nutrition_adherence: f64,
    /// Fraction of the water target met, 0..=1
    pub water_adherence: f64,
    pub sleep_logged: bool,
}

/// One indicator's share of the daily score
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreComponent {
    pub points: f64,
    pub max_points: f64,
    /// Whether the indicator counts as "done" for display
    pub done: bool,
}

/// Daily score with its per-indicator breakdown
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyScore {
    pub score: u8,
    pub workout: ScoreComponent,
    pub nutrition: ScoreComponent,
    pub water: ScoreComponent,
    pub sleep: ScoreComponent,
}

// ============================================================================
// Body composition
// ============================================================================

/// Which body-composition series a sample belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Weight,
    MuscleMass,
    BodyFat,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Weight => "weight",
            MetricKind::MuscleMass => "muscle_mass",
            MetricKind::BodyFat => "body_fat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weight" => Some(MetricKind::Weight),
            "muscle" | "muscle_mass" => Some(MetricKind::MuscleMass),
            "fat" | "body_fat" => Some(MetricKind::BodyFat),
            _ => None,
        }
    }
}

/// A single dated body-composition measurement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BodyMetricSample {
    pub date: NaiveDate,
    pub value: f64,
}

/// Projected date at which a body metric reaches its target
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrendProjection {
    pub current_value: f64,
    pub target_value: f64,
    /// Regression slope in units per day
    pub daily_rate: f64,
    pub predicted_date: NaiveDate,
    /// Days from the last sample to `predicted_date`
    pub days_to_target: i64,
    pub r_squared: f64,
    pub sample_count: usize,
    pub confidence: Confidence,
}

// ============================================================================
// Workouts
// ============================================================================

/// One performed set as entered by the user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSet {
    pub exercise_name: String,
    pub weight_kg: f64,
    pub reps: u32,
}

impl ExerciseSet {
    /// Parse set notation like `80x8`, `62.5 x 10` or `62,5X10` (weight x reps)
    pub fn parse(exercise_name: &str, notation: &str) -> Result<Self> {
        let invalid =
            || Error::InvalidInput(format!("Invalid set {:?}, expected WEIGHTxREPS", notation));

        let lowered = notation.trim().to_lowercase();
        let (weight, reps) = lowered.split_once('x').ok_or_else(invalid)?;
        let weight_kg: f64 = weight.trim().replace(',', ".").parse().map_err(|_| invalid())?;
        let reps: u32 = reps.trim().parse().map_err(|_| invalid())?;

        if !weight_kg.is_finite() || weight_kg <= 0.0 || reps == 0 {
            return Err(invalid());
        }
        if exercise_name.trim().is_empty() {
            return Err(Error::InvalidInput("exercise name must not be empty".into()));
        }

        Ok(Self {
            exercise_name: exercise_name.trim().to_string(),
            weight_kg,
            reps,
        })
    }
}

/// A logged workout: every set performed on one day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub sets: Vec<ExerciseSet>,
}

impl WorkoutRecord {
    pub fn new(date: NaiveDate, sets: Vec<ExerciseSet>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            sets,
        }
    }
}

/// A set flattened out of its workout, keyed by normalized exercise name
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    pub exercise_name: String,
    /// Name as written in the workout, trimmed
    pub display_name: String,
    pub weight_kg: f64,
    pub reps: u32,
    pub date: NaiveDate,
}

/// Predicted next personal record for one exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PrPrediction {
    /// Normalized grouping key
    pub exercise_name: String,
    /// Name as most recently written by the user
    pub display_name: String,
    pub predicted_weight_kg: f64,
    pub predicted_reps: u32,
    pub predicted_date: NaiveDate,
    /// Best estimated one-rep max seen so far
    pub current_one_rep_max: f64,
    /// Estimated one-rep max the prediction corresponds to
    pub target_one_rep_max: f64,
    pub sessions: usize,
    pub confidence: Confidence,
}

// ============================================================================
// Medication
// ============================================================================

/// Fixed daily dose schedule with food restrictions around it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicationConfig {
    #[serde(default = "crate::config::default_dose_time")]
    pub dose_time: NaiveTime,

    /// At most one day; see `Config::validate`
    #[serde(default = "crate::config::default_fasting_before_minutes")]
    pub fasting_before_minutes: i64,

    #[serde(default = "crate::config::default_restriction_after_minutes")]
    pub restriction_after_minutes: i64,
}

/// Which window `now` falls into
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    Idle,
    Fasting,
    Restriction,
}

/// Fasting/restriction state around a dose at a given instant
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicationWindow {
    pub phase: WindowPhase,
    pub is_fasting_active: bool,
    pub is_restriction_active: bool,
    /// Start of the active or upcoming fasting window
    pub fasting_start: NaiveDateTime,
    pub dose_at: NaiveDateTime,
    /// End of the active or upcoming restriction window
    pub restriction_end: NaiveDateTime,
    /// Minutes until the active window ends, or until the next fasting
    /// window starts when idle
    pub minutes_remaining: i64,
}
