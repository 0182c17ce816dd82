//! Personal record prediction from workout history.
//!
//! Progressive overload heuristic:
//! 1. Group sets by normalized exercise name
//! 2. Take the best estimated one-rep max (Epley) per session date
//! 3. Fit a linear trend through the session maxima
//! 4. The next record is the best e1RM plus one typical session's gain
//!    (at least `min_increment_kg`), dated where the trend reaches it

use crate::config::PredictionConfig;
use crate::trend::{crossing_day, day_offset, fit_linear, grade_confidence};
use crate::{Confidence, ExerciseSet, PrPrediction, SetRecord, WorkoutRecord};
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Estimated one-rep max using the Epley formula
///
/// A single rep is already a max, so it is returned as-is.
pub fn epley_one_rep_max(weight_kg: f64, reps: u32) -> f64 {
    if weight_kg <= 0.0 || reps == 0 {
        return 0.0;
    }
    if reps == 1 {
        return weight_kg;
    }
    weight_kg * (1.0 + reps as f64 / 30.0)
}

/// Weight that yields `one_rep_max` when lifted for `reps` (Epley inverse)
pub fn weight_for_reps(one_rep_max: f64, reps: u32) -> f64 {
    if reps <= 1 {
        return one_rep_max;
    }
    one_rep_max / (1.0 + reps as f64 / 30.0)
}

/// Normalize an exercise name into a grouping key
///
/// Trims, lowercases, strips Latin diacritics and collapses inner
/// whitespace, so "Supino Reto", "SUPINO RETO " and "supino  réto" match.
pub fn normalize_exercise_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .flat_map(char::to_lowercase)
                .map(fold_diacritic)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        'ł' => 'l',
        'ř' => 'r',
        other => other,
    }
}

/// Flatten workouts into dated set records keyed by normalized name
///
/// Workouts are visited in date order; workouts sharing a date keep their
/// input order. Sets with no load, no reps or a blank name are dropped.
pub fn flatten_sets(workouts: &[WorkoutRecord]) -> Vec<SetRecord> {
    chronological(workouts)
        .into_iter()
        .flat_map(|workout| {
            workout.sets.iter().filter_map(move |set| {
                let exercise_name = normalize_exercise_name(&set.exercise_name);
                (is_usable(set) && !exercise_name.is_empty()).then(|| SetRecord {
                    exercise_name,
                    display_name: set.exercise_name.trim().to_string(),
                    weight_kg: set.weight_kg,
                    reps: set.reps,
                    date: workout.date,
                })
            })
        })
        .collect()
}

fn is_usable(set: &ExerciseSet) -> bool {
    set.weight_kg.is_finite() && set.weight_kg > 0.0 && set.reps > 0
}

fn chronological(workouts: &[WorkoutRecord]) -> Vec<&WorkoutRecord> {
    let mut ordered: Vec<&WorkoutRecord> = workouts.iter().collect();
    // sort_by_key is stable, so same-day workouts keep input order
    ordered.sort_by_key(|w| w.date);
    ordered
}

/// Predict the next achievable personal record for every exercise with
/// enough history
///
/// Exercises with fewer than `min_sessions` session dates, or whose
/// estimated one-rep max is flat or declining, are left out.
pub fn predict_next_prs(workouts: &[WorkoutRecord], config: &PredictionConfig) -> Vec<PrPrediction> {
    let mut histories: BTreeMap<String, Vec<SetRecord>> = BTreeMap::new();
    for record in flatten_sets(workouts) {
        histories.entry(record.exercise_name.clone()).or_default().push(record);
    }

    let predictions: Vec<PrPrediction> = histories
        .into_iter()
        .filter_map(|(name, sets)| predict_exercise(&name, &sets, config))
        .collect();

    tracing::info!("Predicted next PRs for {} exercises", predictions.len());
    predictions
}

fn predict_exercise(name: &str, sets: &[SetRecord], config: &PredictionConfig) -> Option<PrPrediction> {
    // Best e1RM per session date
    let mut sessions: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for set in sets {
        let e1rm = epley_one_rep_max(set.weight_kg, set.reps);
        let best = sessions.entry(set.date).or_insert(0.0);
        if e1rm > *best {
            *best = e1rm;
        }
    }

    if sessions.len() < config.min_sessions.max(2) {
        tracing::debug!(
            "Skipping {}: {} session(s), need {}",
            name,
            sessions.len(),
            config.min_sessions
        );
        return None;
    }

    let (&first_date, _) = sessions.iter().next()?;
    let (&last_date, _) = sessions.iter().next_back()?;
    let points: Vec<(f64, f64)> = sessions
        .iter()
        .map(|(date, e1rm)| (day_offset(first_date, *date), *e1rm))
        .collect();

    let fit = fit_linear(&points)?;
    if fit.slope < config.trend.min_daily_rate {
        tracing::debug!("Skipping {}: e1RM trend is not rising ({:.4}/day)", name, fit.slope);
        return None;
    }

    let current_best = sessions.values().cloned().fold(0.0, f64::max);
    let last_x = (last_date - first_date).num_days();
    let typical_gap = last_x as f64 / (sessions.len() - 1) as f64;
    let increment = (fit.slope * typical_gap).max(config.min_increment_kg);
    let target = current_best + increment;

    let days_from_first = crossing_day(&fit, target, current_best, last_x)?;
    let predicted_date = first_date.checked_add_days(Days::new(days_from_first as u64))?;

    let predicted_reps = preferred_reps(sets);
    let predicted_weight_kg =
        round_up_to_step(weight_for_reps(target, predicted_reps), config.weight_step_kg);

    let confidence = if sessions.len() < 3 {
        Confidence::Low
    } else {
        grade_confidence(fit.r_squared, sessions.len(), &config.trend)
    };

    Some(PrPrediction {
        exercise_name: name.to_string(),
        display_name: sets.last()?.display_name.clone(),
        predicted_weight_kg,
        predicted_reps,
        predicted_date,
        current_one_rep_max: current_best,
        target_one_rep_max: target,
        sessions: sessions.len(),
        confidence,
    })
}

/// Most common rep count; ties go to the one performed most recently
fn preferred_reps(sets: &[SetRecord]) -> u32 {
    let mut counts: HashMap<u32, (usize, usize)> = HashMap::new();
    for (index, set) in sets.iter().enumerate() {
        let entry = counts.entry(set.reps).or_insert((0, index));
        entry.0 += 1;
        entry.1 = index;
    }

    counts
        .into_iter()
        .max_by_key(|(_, (count, last_index))| (*count, *last_index))
        .map(|(reps, _)| reps)
        .unwrap_or(1)
}

fn round_up_to_step(weight: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return weight;
    }
    ((weight / step) - 1e-9).ceil() * step
}
