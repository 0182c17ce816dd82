use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use wellness_core::*;

#[derive(Parser)]
#[command(name = "wellness")]
#[command(about = "Wellness analytics: daily score, trends, PR predictions, medication windows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User whose history is read or written
    #[arg(long, global = true)]
    user: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute today's wellness score
    Score {
        /// A workout was completed
        #[arg(long)]
        workout: bool,

        /// Nutrition adherence fraction (0-1)
        #[arg(long, default_value_t = 0.0)]
        nutrition: f64,

        /// Water adherence fraction (0-1)
        #[arg(long, default_value_t = 0.0)]
        water: f64,

        /// Sleep was logged
        #[arg(long)]
        sleep: bool,

        /// Print per-indicator points and done flags
        #[arg(long)]
        breakdown: bool,
    },

    /// Project when a body metric reaches a target
    Trend {
        /// Metric series (weight, muscle_mass, body_fat)
        #[arg(long, default_value = "weight")]
        metric: String,

        /// Target value
        #[arg(long, allow_negative_numbers = true)]
        target: f64,

        /// Only use samples on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
    },

    /// Predict the next personal record per exercise
    Prs {
        /// Only use workouts on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
    },

    /// Show the current medication fasting/restriction window
    Window {
        /// Evaluate at this local time instead of now (YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        at: Option<NaiveDateTime>,
    },

    /// Record a body metric sample
    LogMetric {
        /// Metric series (weight, muscle_mass, body_fat)
        #[arg(long, default_value = "weight")]
        metric: String,

        #[arg(long)]
        value: f64,

        /// Measurement date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record a workout for one exercise
    LogWorkout {
        /// Exercise name as you call it
        #[arg(long)]
        exercise: String,

        /// Set as WEIGHTxREPS, repeatable (e.g. --set 80x8 --set 80x7)
        #[arg(long = "set", required = true)]
        sets: Vec<String>,

        /// Workout date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    wellness_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data.data_dir.clone());
    let user = cli.user.clone().unwrap_or_else(|| config.data.user.clone());

    match cli.command {
        Commands::Score {
            workout,
            nutrition,
            water,
            sleep,
            breakdown,
        } => cmd_score(
            DailyScoreInput {
                workout_completed: workout,
                nutrition_adherence: nutrition,
                water_adherence: water,
                sleep_logged: sleep,
            },
            breakdown,
            &config,
        ),
        Commands::Trend {
            metric,
            target,
            since,
        } => cmd_trend(&FileHistory::for_user(&data_dir, &user)?, &metric, target, since, &config),
        Commands::Prs { since } => cmd_prs(&FileHistory::for_user(&data_dir, &user)?, since, &config),
        Commands::Window { at } => cmd_window(at, &config),
        Commands::LogMetric {
            metric,
            value,
            date,
        } => cmd_log_metric(&FileHistory::for_user(&data_dir, &user)?, &metric, value, date),
        Commands::LogWorkout {
            exercise,
            sets,
            date,
        } => cmd_log_workout(&FileHistory::for_user(&data_dir, &user)?, &exercise, &sets, date),
    }
}

fn cmd_score(input: DailyScoreInput, breakdown: bool, config: &Config) -> Result<()> {
    if breakdown {
        print_json(&score_breakdown(&input, &config.scoring))
    } else {
        println!("{}", compute_daily_score(&input, &config.scoring));
        Ok(())
    }
}

fn cmd_trend(
    history: &impl HistorySource,
    metric: &str,
    target: f64,
    since: Option<NaiveDate>,
    config: &Config,
) -> Result<()> {
    let kind = parse_metric(metric)?;
    let range = since.map(DateRange::since).unwrap_or_default();
    let samples = history.body_metrics(kind, range)?;

    let projection = project_trend(&samples, target, &config.trend);
    if projection.is_none() {
        tracing::info!(
            "No projection for {} from {} samples (not enough data or trend not toward target)",
            kind.as_str(),
            samples.len()
        );
    }
    print_json(&projection)
}

fn cmd_prs(history: &impl HistorySource, since: Option<NaiveDate>, config: &Config) -> Result<()> {
    let range = since.map(DateRange::since).unwrap_or_default();
    let workouts = history.workouts(range)?;
    print_json(&predict_next_prs(&workouts, &config.prediction))
}

fn cmd_window(at: Option<NaiveDateTime>, config: &Config) -> Result<()> {
    let now = at.unwrap_or_else(|| Local::now().naive_local());
    print_json(&calculate_window(&config.medication, now))
}

fn cmd_log_metric(
    history: &FileHistory,
    metric: &str,
    value: f64,
    date: Option<NaiveDate>,
) -> Result<()> {
    let kind = parse_metric(metric)?;
    let sample = BodyMetricSample {
        date: date.unwrap_or_else(today),
        value,
    };
    history.record_metric(kind, &sample)?;

    println!("✓ Recorded {} {} on {}", kind.as_str(), sample.value, sample.date);
    Ok(())
}

fn cmd_log_workout(
    history: &FileHistory,
    exercise: &str,
    sets: &[String],
    date: Option<NaiveDate>,
) -> Result<()> {
    let sets = sets
        .iter()
        .map(|notation| ExerciseSet::parse(exercise, notation))
        .collect::<Result<Vec<_>>>()?;

    let workout = WorkoutRecord::new(date.unwrap_or_else(today), sets);
    history.record_workout(&workout)?;

    println!(
        "✓ Logged {} set(s) of {} on {}",
        workout.sets.len(),
        exercise.trim(),
        workout.date
    );
    Ok(())
}

fn parse_metric(metric: &str) -> Result<MetricKind> {
    MetricKind::parse(metric)
        .ok_or_else(|| Error::InvalidInput(format!("Unknown metric: {}", metric)))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
