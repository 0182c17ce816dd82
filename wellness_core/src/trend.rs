//! Linear trend projection for body-composition series.
//!
//! Fits an ordinary least-squares line of value over elapsed days and
//! solves it for the day the target is crossed. The same fit is reused by
//! the PR predictor for estimated one-rep-max series.

use crate::config::TrendConfig;
use crate::{BodyMetricSample, Confidence, TrendProjection};
use chrono::{Days, NaiveDate};

/// Result of an ordinary least-squares fit `y = intercept + slope * x`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, 0..=1
    pub r_squared: f64,
}

impl LinearFit {
    /// The x where the fitted line equals `y`, if the line is not flat
    pub fn solve_for(&self, y: f64) -> Option<f64> {
        if self.slope == 0.0 {
            return None;
        }
        Some((y - self.intercept) / self.slope)
    }
}

/// Fit a least-squares line through `(x, y)` points
///
/// Returns None for fewer than two points or when all x are equal.
pub fn fit_linear(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    if sxx.abs() < f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let sst: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
    let sse: f64 = points
        .iter()
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    let r_squared = if sst.abs() < f64::EPSILON {
        1.0
    } else {
        (1.0 - sse / sst).clamp(0.0, 1.0)
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Grade a fit by goodness-of-fit and by how many points back it
pub(crate) fn grade_confidence(r_squared: f64, points: usize, config: &TrendConfig) -> Confidence {
    let fit_points = if r_squared > config.high_r_squared {
        2
    } else {
        i32::from(r_squared > config.medium_r_squared)
    };

    let data_points = if points >= config.min_confident_samples * 2 {
        2
    } else {
        i32::from(points >= config.min_confident_samples)
    };

    match fit_points + data_points {
        4 => Confidence::VeryHigh,
        3 => Confidence::High,
        2 => Confidence::Medium,
        _ => Confidence::Low,
    }
}

/// Project when a body metric series reaches `target`
///
/// Returns None when there is no actionable projection: fewer than two
/// distinct dates, a flat trend, or a trend moving away from the target.
pub fn project_trend(
    samples: &[BodyMetricSample],
    target: f64,
    config: &TrendConfig,
) -> Option<TrendProjection> {
    if samples.len() < 2 || !target.is_finite() {
        tracing::debug!("Trend needs at least 2 samples, got {}", samples.len());
        return None;
    }

    let origin = samples.iter().map(|s| s.date).min()?;
    // Latest date wins; equal dates keep the later input entry
    let latest = samples
        .iter()
        .fold(None::<&BodyMetricSample>, |best, s| match best {
            Some(b) if b.date > s.date => Some(b),
            _ => Some(s),
        })?;

    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| (day_offset(origin, s.date), s.value))
        .collect();

    let Some(fit) = fit_linear(&points) else {
        tracing::debug!("Trend needs at least 2 distinct dates");
        return None;
    };

    if fit.slope.abs() < config.min_daily_rate {
        tracing::debug!("Trend is flat ({:.6}/day), no projection", fit.slope);
        return None;
    }

    let current_value = latest.value;
    let last_x = (latest.date - origin).num_days();
    let required = target - current_value;

    let days_from_origin = if required == 0.0 {
        last_x
    } else if required.signum() != fit.slope.signum() {
        tracing::debug!(
            "Trend {:.4}/day moves away from target {} (current {})",
            fit.slope,
            target,
            current_value
        );
        return None;
    } else {
        crossing_day(&fit, target, current_value, last_x)?
    };

    let predicted_date = origin.checked_add_days(Days::new(days_from_origin as u64))?;

    Some(TrendProjection {
        current_value,
        target_value: target,
        daily_rate: fit.slope,
        predicted_date,
        days_to_target: days_from_origin - last_x,
        r_squared: fit.r_squared,
        sample_count: samples.len(),
        confidence: grade_confidence(fit.r_squared, samples.len(), config),
    })
}

/// Day offset at which the fitted line reaches `target`
///
/// A fitted crossing at or before `last_x` means the line already passed the
/// target while the latest value has not; the remaining distance from
/// `current` is then covered at the fitted rate, so the result is always
/// after `last_x`.
pub(crate) fn crossing_day(fit: &LinearFit, target: f64, current: f64, last_x: i64) -> Option<i64> {
    let day = whole_days(fit.solve_for(target)?)?;
    if day > last_x {
        return Some(day);
    }
    let remaining = whole_days((target - current) / fit.slope)?;
    Some(last_x + remaining.max(1))
}

/// Round a fractional day count up; None when it does not fit a date
fn whole_days(days: f64) -> Option<i64> {
    if !days.is_finite() || days.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    // Tolerate float noise so an exact day does not round up
    Some((days - 1e-6).ceil() as i64)
}

/// Days between two dates as a float offset
pub(crate) fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}
