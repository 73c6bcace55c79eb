#![allow(clippy::const_is_empty)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod app;
pub mod config;
pub mod data;
pub mod domain;
pub mod models;
pub mod report;
pub mod utils;

// Re-export commonly used types outside of crate
pub use crate::models::OhlcvTimeSeries;
pub use config::PERSISTENCE;
pub use domain::{PairInterval, Period};

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};

use crate::{
    analysis::ForecastSettings,
    app::{LogEntry, NewRoutine},
    config::constants::{bitcoin, route_sim},
    data::BinanceProvider,
    domain::{ExerciseType, parse_day_abbrev},
    models::MlpConfig,
    utils::TimeUtils,
};

// CLI argument parsing
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Working directory for every input and output file
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct MarketArgs {
    /// Binance spot pair
    #[arg(long, default_value = bitcoin::PAIR)]
    pub pair: String,

    /// Candle interval (1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w, 1M)
    #[arg(
        long,
        default_value = TimeUtils::interval_to_string(bitcoin::basic::INTERVAL_MS),
        value_parser = parse_interval
    )]
    pub interval: i64,

    /// How far back to download, e.g. 90d, 3mo, 2y
    #[arg(long, default_value = bitcoin::basic::PERIOD)]
    pub period: Period,

    /// Most recent candles to analyse
    #[arg(long, default_value_t = bitcoin::ANALYSIS_ROWS)]
    pub rows: usize,

    /// Candles to forecast past the last one
    #[arg(long, default_value_t = bitcoin::basic::FUTURE_STEPS)]
    pub steps: usize,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Linear trend over recent candles, extended into the future
    BitcoinBasic(MarketArgs),

    /// MLP over a sliding window of features with a recursive forecast
    BitcoinDeep {
        #[command(flatten)]
        market: MarketArgs,

        #[arg(long, default_value_t = bitcoin::deep::LOOKBACK)]
        lookback: usize,

        #[arg(long, default_value_t = bitcoin::mlp::MAX_ITER)]
        max_iter: usize,

        #[arg(long, default_value_t = bitcoin::mlp::RANDOM_STATE)]
        seed: u64,

        /// Dropout after the first hidden layer, e.g. 0.2
        #[arg(long)]
        dropout: Option<f64>,
    },

    /// Today's routine, recovery check, recommendations and charts
    Exercise {
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, default_value_t = false)]
        no_charts: bool,
    },

    /// Append one session to the records log
    ExerciseLog {
        #[arg(long)]
        exercise: String,

        /// Y or N
        #[arg(long, default_value = "Y", value_parser = parse_done, action = clap::ArgAction::Set)]
        done: bool,

        #[arg(long)]
        rpe: Option<f64>,

        #[arg(long)]
        hour: Option<u32>,

        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Defaults to the routine's reps
        #[arg(long)]
        target: Option<u32>,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        intensity: Option<u8>,
    },

    /// Add, remove, reschedule or list stored routines
    ExerciseRoutine {
        #[command(subcommand)]
        action: RoutineAction,
    },

    /// Monthly summary of the records log
    ExerciseReport {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,

        /// Defaults to the current month
        #[arg(long)]
        month: Option<u32>,
    },

    /// Merge VDS exports, keep the target junctions, add density
    TrafficLoad {
        /// Directory holding the VDS_* folders; defaults to --dir
        #[arg(long)]
        raw_dir: Option<PathBuf>,
    },

    /// Weekday stats, Greenshields fit, charts and JSON summary
    TrafficAnalyze {
        #[arg(long, default_value_t = false)]
        no_charts: bool,
    },

    /// Two-route BPR travel time simulation
    RouteSim {
        /// Total demand in veh/h
        #[arg(long, default_value_t = route_sim::DEFAULT_DEMAND)]
        demand: f64,

        /// Share of demand on route A, in percent
        #[arg(long, default_value_t = route_sim::DEFAULT_SPLIT_A_PCT)]
        split: f64,

        /// Print a table of splits from 0 to 100% in steps of 10
        #[arg(long, default_value_t = false)]
        sweep: bool,

        /// Summary JSON to read uf and C from
        #[arg(long)]
        params: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RoutineAction {
    /// Store a new routine under a generated key
    Add {
        #[arg(long)]
        name: String,

        /// Comma separated, e.g. Mon,Wed,Fri
        #[arg(long, required = true, value_delimiter = ',', value_parser = parse_day)]
        days: Vec<String>,

        /// Defaults to 15
        #[arg(long)]
        reps: Option<u32>,

        /// Defaults to reps
        #[arg(long)]
        unit: Option<String>,

        /// upper, lower, core, cardio or mobility
        #[arg(long = "type")]
        kind: ExerciseType,

        /// 1 to 5, defaults to 2
        #[arg(long)]
        intensity: Option<u8>,
    },

    /// Delete a routine by key
    Remove { key: String },

    /// Replace a routine's days; no days unschedules it
    Days {
        key: String,

        #[arg(value_delimiter = ',', value_parser = parse_day)]
        days: Vec<String>,
    },

    /// Print every stored routine
    List,
}

fn parse_interval(s: &str) -> std::result::Result<i64, String> {
    TimeUtils::interval_from_str(s).ok_or_else(|| format!("unknown interval '{}'", s))
}

fn parse_done(s: &str) -> std::result::Result<bool, String> {
    match s.to_ascii_uppercase().as_str() {
        "Y" | "YES" => Ok(true),
        "N" | "NO" => Ok(false),
        _ => Err(format!("expected Y or N, got '{}'", s)),
    }
}

fn parse_day(s: &str) -> std::result::Result<String, String> {
    parse_day_abbrev(s)
        .map(str::to_string)
        .ok_or_else(|| format!("unknown day '{}', use Mon..Sun", s))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Dispatch one subcommand.
pub async fn run(cli: Cli) -> Result<()> {
    let base = cli.dir.as_path();

    match cli.command {
        Command::BitcoinBasic(m) => {
            let provider = BinanceProvider::default();
            let pair_interval = PairInterval::new(m.pair, m.interval);
            app::bitcoin_basic(&provider, &pair_interval, m.period, m.rows, m.steps, base).await
        }
        Command::BitcoinDeep {
            market: m,
            lookback,
            max_iter,
            seed,
            dropout,
        } => {
            let provider = BinanceProvider::default();
            let pair_interval = PairInterval::new(m.pair, m.interval);
            let settings = ForecastSettings {
                lookback,
                ..Default::default()
            };
            let mlp_config = MlpConfig {
                max_iter,
                random_state: seed,
                dropout,
                ..Default::default()
            };
            app::bitcoin_deep(
                &provider,
                &pair_interval,
                m.period,
                m.rows,
                settings,
                mlp_config,
                m.steps,
                base,
            )
            .await
        }
        Command::Exercise { date, no_charts } => {
            app::exercise_overview(base, date.unwrap_or_else(today), !no_charts)
        }
        Command::ExerciseLog {
            exercise,
            done,
            rpe,
            hour,
            date,
            target,
            unit,
            intensity,
        } => app::exercise_log(
            base,
            LogEntry {
                date: date.unwrap_or_else(today),
                exercise,
                done,
                rpe,
                hour,
                target,
                unit,
                intensity,
            },
        )
        .map(|_| ()),
        Command::ExerciseRoutine { action } => match action {
            RoutineAction::Add {
                name,
                days,
                reps,
                unit,
                kind,
                intensity,
            } => app::routine_add(
                base,
                NewRoutine {
                    name,
                    days,
                    reps,
                    unit,
                    kind,
                    intensity,
                },
            )
            .map(|_| ()),
            RoutineAction::Remove { key } => app::routine_remove(base, &key).map(|_| ()),
            RoutineAction::Days { key, days } => {
                app::routine_set_days(base, &key, &days).map(|_| ())
            }
            RoutineAction::List => app::routine_list(base),
        },
        Command::ExerciseReport { year, month } => {
            let now = today();
            app::exercise_report(
                base,
                year.unwrap_or(now.year()),
                month.unwrap_or(now.month()),
            )
        }
        Command::TrafficLoad { raw_dir } => {
            let raw = raw_dir.unwrap_or_else(|| cli.dir.clone());
            app::traffic_load(base, &raw).map(|_| ())
        }
        Command::TrafficAnalyze { no_charts } => app::traffic_analyze(base, !no_charts).map(|_| ()),
        Command::RouteSim {
            demand,
            split,
            sweep,
            params,
        } => app::route_sim(base, params.as_deref(), demand, split, sweep).map(|_| ()),
    }
}
