//! Daily wellness score.
//!
//! Combines the four daily signals into a single 0-100 score. Workout and
//! sleep are all-or-nothing; nutrition and water count proportionally to
//! their adherence fraction.

use crate::config::ScoringConfig;
use crate::{DailyScore, DailyScoreInput, ScoreComponent};

/// Compute the 0-100 daily score for one day's signals
pub fn compute_daily_score(input: &DailyScoreInput, config: &ScoringConfig) -> u8 {
    score_breakdown(input, config).score
}

/// Compute the daily score together with each indicator's contribution
pub fn score_breakdown(input: &DailyScoreInput, config: &ScoringConfig) -> DailyScore {
    let nutrition = clamp_fraction(input.nutrition_adherence);
    let water = clamp_fraction(input.water_adherence);

    let workout = component(
        bool_fraction(input.workout_completed),
        config.workout_weight,
        input.workout_completed,
    );
    let nutrition = component(
        nutrition,
        config.nutrition_weight,
        nutrition >= config.done_threshold,
    );
    let water = component(water, config.water_weight, water >= config.done_threshold);
    let sleep = component(
        bool_fraction(input.sleep_logged),
        config.sleep_weight,
        input.sleep_logged,
    );

    let total_weight = config.total_weight();
    let score = if total_weight > 0.0 {
        let earned = workout.points + nutrition.points + water.points + sleep.points;
        (earned / total_weight * 100.0).round().clamp(0.0, 100.0) as u8
    } else {
        0
    };

    tracing::debug!(
        "Daily score {} (workout {:.1}, nutrition {:.1}, water {:.1}, sleep {:.1})",
        score,
        workout.points,
        nutrition.points,
        water.points,
        sleep.points
    );

    DailyScore {
        score,
        workout,
        nutrition,
        water,
        sleep,
    }
}

fn component(fraction: f64, weight: f64, done: bool) -> ScoreComponent {
    ScoreComponent {
        points: fraction * weight,
        max_points: weight,
        done,
    }
}

fn bool_fraction(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// NaN and out-of-range adherence count as the nearest valid value (NaN → 0)
fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
