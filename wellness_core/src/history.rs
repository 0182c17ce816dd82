//! History repository for one user's body metrics and workouts.
//!
//! The calculators never read files themselves: callers fetch plain
//! samples and records through [`HistorySource`] and pass them in.
//!
//! On-disk layout under the data directory:
//! ```text
//! users/<user>/body_metrics.csv   date,kind,value
//! users/<user>/workouts.jsonl     one WorkoutRecord per line
//! ```

use crate::{BodyMetricSample, DateRange, Error, MetricKind, Result, WorkoutRecord};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Read side of a user's history
pub trait HistorySource {
    /// Body metric samples of one kind, oldest first
    fn body_metrics(&self, kind: MetricKind, range: DateRange) -> Result<Vec<BodyMetricSample>>;

    /// Logged workouts, oldest first
    fn workouts(&self, range: DateRange) -> Result<Vec<WorkoutRecord>>;
}

/// CSV row format for body metrics
#[derive(Debug, Serialize, Deserialize)]
struct MetricRow {
    date: String,
    kind: String,
    value: f64,
}

impl MetricRow {
    fn into_sample(self) -> Result<(MetricKind, BodyMetricSample)> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| Error::InvalidInput(format!("Invalid date {:?}: {}", self.date, e)))?;
        let kind = MetricKind::parse(&self.kind)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown metric kind {:?}", self.kind)))?;
        if !self.value.is_finite() {
            return Err(Error::InvalidInput(format!("Non-finite value on {}", self.date)));
        }
        Ok((
            kind,
            BodyMetricSample {
                date,
                value: self.value,
            },
        ))
    }
}

/// File-backed history for a single user
#[derive(Clone, Debug)]
pub struct FileHistory {
    user_dir: PathBuf,
}

impl FileHistory {
    /// History for `user` under `data_dir/users/<user>`
    pub fn for_user(data_dir: &Path, user: &str) -> Result<Self> {
        let user = user.trim();
        if user.is_empty()
            || !user
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            || user.starts_with('.')
        {
            return Err(Error::InvalidInput(format!("Invalid user identifier {:?}", user)));
        }
        Ok(Self {
            user_dir: data_dir.join("users").join(user),
        })
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.user_dir.join("body_metrics.csv")
    }

    pub fn workouts_path(&self) -> PathBuf {
        self.user_dir.join("workouts.jsonl")
    }

    /// Append one body metric sample
    pub fn record_metric(&self, kind: MetricKind, sample: &BodyMetricSample) -> Result<()> {
        append_body_metric(&self.metrics_path(), kind, sample)
    }

    /// Append one workout to the journal
    pub fn record_workout(&self, workout: &WorkoutRecord) -> Result<()> {
        append_workout(&self.workouts_path(), workout)
    }
}

impl HistorySource for FileHistory {
    fn body_metrics(&self, kind: MetricKind, range: DateRange) -> Result<Vec<BodyMetricSample>> {
        let path = self.metrics_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut samples: Vec<BodyMetricSample> = load_metric_rows(&path)?
            .into_iter()
            .filter(|(k, sample)| *k == kind && range.contains(sample.date))
            .map(|(_, sample)| sample)
            .collect();
        samples.sort_by_key(|s| s.date);

        tracing::debug!("Loaded {} {} samples", samples.len(), kind.as_str());
        Ok(samples)
    }

    fn workouts(&self, range: DateRange) -> Result<Vec<WorkoutRecord>> {
        let path = self.workouts_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        // Stable sort: same-day workouts stay in the order they were logged
        let mut workouts = load_workouts(&path, range)?;
        workouts.sort_by_key(|w| w.date);

        tracing::debug!("Loaded {} workouts", workouts.len());
        Ok(workouts)
    }
}

/// Append a body metric row, writing the CSV header on first use
pub fn append_body_metric(path: &Path, kind: MetricKind, sample: &BodyMetricSample) -> Result<()> {
    if !sample.value.is_finite() {
        return Err(Error::InvalidInput("metric value must be finite".into()));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;

    let needs_header = file.metadata()?.len() == 0;
    {
        let mut writer = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(&file);
        writer.serialize(MetricRow {
            date: sample.date.format("%Y-%m-%d").to_string(),
            kind: kind.as_str().to_string(),
            value: sample.value,
        })?;
        writer.flush()?;
    }

    file.sync_all()?;
    file.unlock()?;

    tracing::debug!("Recorded {} = {} on {}", kind.as_str(), sample.value, sample.date);
    Ok(())
}

/// Append a workout as one JSON line
pub fn append_workout(path: &Path, workout: &WorkoutRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut line = serde_json::to_string(workout)?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;
    file.write_all(line.as_bytes())?;
    file.sync_all()?;
    file.unlock()?;

    tracing::debug!(
        "Recorded workout {} on {} ({} sets)",
        workout.id,
        workout.date,
        workout.sets.len()
    );
    Ok(())
}

/// Workouts within `range`, in file order; unparseable lines are logged and skipped
fn load_workouts(path: &Path, range: DateRange) -> Result<Vec<WorkoutRecord>> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut workouts = Vec::new();
    for (index, line) in BufReader::new(&file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WorkoutRecord>(&line) {
            Ok(workout) if range.contains(workout.date) => workouts.push(workout),
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping workout on line {}: {}", index + 1, e),
        }
    }

    file.unlock()?;
    Ok(workouts)
}

/// Load every parseable row; bad rows are logged and skipped
fn load_metric_rows(path: &Path) -> Result<Vec<(MetricKind, BodyMetricSample)>> {
    let file = std::fs::File::open(path)?;
    file.lock_shared()?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(&file);
    let mut rows = Vec::new();
    for result in reader.deserialize::<MetricRow>() {
        match result {
            Ok(row) => match row.into_sample() {
                Ok(parsed) => rows.push(parsed),
                Err(e) => tracing::warn!("Skipping body metric row: {}", e),
            },
            Err(e) => tracing::warn!("Failed to deserialize body metric row: {}", e),
        }
    }

    file.unlock()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExerciseSet;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn sample(day: u32, value: f64) -> BodyMetricSample {
        BodyMetricSample {
            date: date(day),
            value,
        }
    }

    #[test]
    fn test_metrics_roundtrip_filtered_by_kind() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = FileHistory::for_user(temp_dir.path(), "alice").unwrap();

        history.record_metric(MetricKind::Weight, &sample(3, 80.0)).unwrap();
        history.record_metric(MetricKind::MuscleMass, &sample(3, 35.2)).unwrap();
        history.record_metric(MetricKind::Weight, &sample(1, 80.6)).unwrap();

        let weights = history.body_metrics(MetricKind::Weight, DateRange::default()).unwrap();
        assert_eq!(weights, vec![sample(1, 80.6), sample(3, 80.0)]);

        let muscle = history.body_metrics(MetricKind::MuscleMass, DateRange::default()).unwrap();
        assert_eq!(muscle, vec![sample(3, 35.2)]);

        // Header written exactly once
        let contents = std::fs::read_to_string(history.metrics_path()).unwrap();
        assert_eq!(contents.matches("date,kind,value").count(), 1);
    }

    #[test]
    fn test_date_range_filter() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = FileHistory::for_user(temp_dir.path(), "bob").unwrap();
        for day in 1..=5 {
            history.record_metric(MetricKind::Weight, &sample(day, 80.0 - day as f64)).unwrap();
        }

        let range = DateRange {
            from: Some(date(2)),
            to: Some(date(4)),
        };
        let samples = history.body_metrics(MetricKind::Weight, range).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].date, date(2));
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = FileHistory::for_user(temp_dir.path(), "carol").unwrap();
        history.record_metric(MetricKind::Weight, &sample(1, 80.0)).unwrap();

        let mut contents = std::fs::read_to_string(history.metrics_path()).unwrap();
        contents.push_str("not-a-date,weight,80\n2024-04-02,height,180\n");
        std::fs::write(history.metrics_path(), contents).unwrap();
        history.record_metric(MetricKind::Weight, &sample(3, 79.0)).unwrap();

        let samples = history.body_metrics(MetricKind::Weight, DateRange::default()).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn test_users_are_isolated() {
        let temp_dir = tempfile::tempdir().unwrap();
        let alice = FileHistory::for_user(temp_dir.path(), "alice").unwrap();
        let bob = FileHistory::for_user(temp_dir.path(), "bob").unwrap();

        alice
            .record_workout(&WorkoutRecord::new(
                date(1),
                vec![ExerciseSet {
                    exercise_name: "Supino".into(),
                    weight_kg: 50.0,
                    reps: 10,
                }],
            ))
            .unwrap();

        assert_eq!(alice.workouts(DateRange::default()).unwrap().len(), 1);
        assert!(bob.workouts(DateRange::default()).unwrap().is_empty());
    }

    #[test]
    fn test_workouts_sorted_and_filtered() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = FileHistory::for_user(temp_dir.path(), "dave").unwrap();
        for day in [9, 2, 5] {
            history.record_workout(&WorkoutRecord::new(date(day), vec![])).unwrap();
        }

        let workouts = history.workouts(DateRange::since(date(3))).unwrap();
        let days: Vec<NaiveDate> = workouts.iter().map(|w| w.date).collect();
        assert_eq!(days, vec![date(5), date(9)]);
    }

    #[test]
    fn test_truncated_workout_line_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = FileHistory::for_user(temp_dir.path(), "frank").unwrap();
        let workout = WorkoutRecord::new(
            date(1),
            vec![ExerciseSet {
                exercise_name: "Remada".into(),
                weight_kg: 55.0,
                reps: 12,
            }],
        );
        history.record_workout(&workout).unwrap();
        {
            let mut file = OpenOptions::new()
                .append(true)
                .open(history.workouts_path())
                .unwrap();
            writeln!(file, "{{\"id\": \"trunc").unwrap();
        }
        history.record_workout(&WorkoutRecord::new(date(2), vec![])).unwrap();

        let workouts = history.workouts(DateRange::default()).unwrap();
        assert_eq!(workouts.len(), 2);
        assert_eq!(workouts[0], workout);
    }

    #[test]
    fn test_same_day_workouts_keep_logged_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = FileHistory::for_user(temp_dir.path(), "gina").unwrap();
        let first = WorkoutRecord::new(date(4), vec![]);
        let second = WorkoutRecord::new(date(4), vec![]);
        history.record_workout(&WorkoutRecord::new(date(6), vec![])).unwrap();
        history.record_workout(&first).unwrap();
        history.record_workout(&second).unwrap();

        let workouts = history.workouts(DateRange::default()).unwrap();
        let ids: Vec<_> = workouts.iter().map(|w| w.id).collect();
        assert_eq!(ids[..2], [first.id, second.id]);
    }

    #[test]
    fn test_rejects_path_like_user_ids() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(FileHistory::for_user(temp_dir.path(), "../etc").is_err());
        assert!(FileHistory::for_user(temp_dir.path(), "").is_err());
        assert!(FileHistory::for_user(temp_dir.path(), "a/b").is_err());
        assert!(FileHistory::for_user(temp_dir.path(), "user-01").is_ok());
    }

    #[test]
    fn test_missing_files_give_empty_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = FileHistory::for_user(temp_dir.path(), "erin").unwrap();
        assert!(history.body_metrics(MetricKind::Weight, DateRange::default()).unwrap().is_empty());
        assert!(history.workouts(DateRange::default()).unwrap().is_empty());
    }
}
