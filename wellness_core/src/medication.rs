//! Fasting and restriction windows around a fixed daily medication dose.
//!
//! Windows for a dose at `T` are:
//! - fasting:     `[T - fasting_before, T)`
//! - restriction: `[T, T + restriction_after)`
//!
//! The state is recomputed from `now` on every call. Doses from yesterday,
//! today and tomorrow are all considered so windows that cross midnight
//! (an early dose whose fasting starts the previous evening, or a late dose
//! whose restriction runs past midnight) resolve correctly.

use crate::config::MAX_WINDOW_MINUTES;
use crate::{MedicationConfig, MedicationWindow, WindowPhase};
use chrono::{Days, Duration, NaiveDateTime};

/// One dose and its surrounding windows
#[derive(Clone, Copy, Debug)]
struct DoseCycle {
    fasting_start: NaiveDateTime,
    dose_at: NaiveDateTime,
    restriction_end: NaiveDateTime,
}

impl DoseCycle {
    /// Dose on `now`'s date shifted by `day_offset`; None past the calendar range
    fn anchored(config: &MedicationConfig, day_offset: i64, now: NaiveDateTime) -> Option<Self> {
        let date = if day_offset < 0 {
            now.date().checked_sub_days(Days::new(day_offset.unsigned_abs()))?
        } else {
            now.date().checked_add_days(Days::new(day_offset.unsigned_abs()))?
        };
        let dose_at = date.and_time(config.dose_time);
        let before = Duration::minutes(clamp_minutes(config.fasting_before_minutes));
        let after = Duration::minutes(clamp_minutes(config.restriction_after_minutes));
        Some(Self {
            fasting_start: dose_at.checked_sub_signed(before)?,
            dose_at,
            restriction_end: dose_at.checked_add_signed(after)?,
        })
    }

    fn phase_at(&self, now: NaiveDateTime) -> WindowPhase {
        if now >= self.fasting_start && now < self.dose_at {
            WindowPhase::Fasting
        } else if now >= self.dose_at && now < self.restriction_end {
            WindowPhase::Restriction
        } else {
            WindowPhase::Idle
        }
    }
}

/// Compute which window `now` falls into and how long until it changes
///
/// Durations are clamped to `0..=MAX_WINDOW_MINUTES`; `Config::validate`
/// rejects anything outside that range for configuration loaded from disk.
pub fn calculate_window(config: &MedicationConfig, now: NaiveDateTime) -> MedicationWindow {
    let cycles: Vec<DoseCycle> = [-1, 0, 1, 2]
        .into_iter()
        .filter_map(|offset| DoseCycle::anchored(config, offset, now))
        .collect();

    let active = cycles
        .iter()
        .map(|cycle| (cycle, cycle.phase_at(now)))
        .find(|(_, phase)| *phase != WindowPhase::Idle);

    let (cycle, phase, boundary) = match active {
        Some((cycle, WindowPhase::Fasting)) => (*cycle, WindowPhase::Fasting, cycle.dose_at),
        Some((cycle, _)) => (*cycle, WindowPhase::Restriction, cycle.restriction_end),
        None => {
            // Idle: count down to the next fasting window
            let next = cycles
                .iter()
                .filter(|cycle| cycle.fasting_start > now)
                .min_by_key(|cycle| cycle.fasting_start)
                .or(cycles.last())
                .copied()
                .unwrap_or(DoseCycle {
                    fasting_start: now,
                    dose_at: now,
                    restriction_end: now,
                });
            (next, WindowPhase::Idle, next.fasting_start)
        }
    };

    let minutes_remaining = minutes_until(now, boundary);

    tracing::debug!(
        "Medication window at {}: {:?}, {} min until {}",
        now,
        phase,
        minutes_remaining,
        boundary
    );

    MedicationWindow {
        phase,
        is_fasting_active: phase == WindowPhase::Fasting,
        is_restriction_active: phase == WindowPhase::Restriction,
        fasting_start: cycle.fasting_start,
        dose_at: cycle.dose_at,
        restriction_end: cycle.restriction_end,
        minutes_remaining,
    }
}

fn clamp_minutes(minutes: i64) -> i64 {
    minutes.clamp(0, MAX_WINDOW_MINUTES)
}

/// Whole minutes until `until`, rounded up so a countdown never shows 0 early
fn minutes_until(now: NaiveDateTime, until: NaiveDateTime) -> i64 {
    let seconds = (until - now).num_seconds().max(0);
    (seconds + 59) / 60
}
