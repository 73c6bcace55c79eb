//! Rule-based exercise coaching over the records log.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use itertools::Itertools;
use statrs::statistics::Statistics;

use crate::config::constants::exercise::{recommend, recovery, schedule};
use crate::domain::{ExerciseRecord, ExerciseType, Routine, Routines};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Routines scheduled on the weekday of `date`, in key order.
pub fn today_routine(routines: &Routines, date: NaiveDate) -> Vec<(&str, &Routine)> {
    routines
        .iter()
        .filter(|(_, r)| r.is_scheduled_on(date.weekday()))
        .map(|(k, r)| (k.as_str(), r))
        .collect()
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryReason {
    HighRpe { mean: f64 },
    Streak { days: usize },
    MissedSessions { missed: usize, of: usize },
}

impl fmt::Display for RecoveryReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecoveryReason::HighRpe { mean } => write!(
                f,
                "Recent average RPE is {:.1}; you may be overreaching.",
                mean
            ),
            RecoveryReason::Streak { days } => write!(
                f,
                "You trained {} or more days in a row; a rest day may help.",
                days
            ),
            RecoveryReason::MissedSessions { missed, of } => write!(
                f,
                "{} of the last {} sessions were missed; completion is dropping.",
                missed, of
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryCheck {
    pub reasons: Vec<RecoveryReason>,
}

impl RecoveryCheck {
    pub fn needed(&self) -> bool {
        !self.reasons.is_empty()
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// Longest run of consecutive calendar days with at least one completed record.
pub fn longest_done_streak(records: &[ExerciseRecord]) -> usize {
    let dates: BTreeSet<NaiveDate> = records
        .iter()
        .filter(|r| r.is_done())
        .map(|r| r.date)
        .collect();

    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for d in dates {
        run = match prev {
            Some(p) if (d - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(d);
    }
    best
}

pub fn need_recovery(records: &[ExerciseRecord]) -> RecoveryCheck {
    let mut check = RecoveryCheck::default();
    if records.is_empty() {
        return check;
    }

    let rpes: Vec<f64> = last_n(records, recovery::RPE_WINDOW)
        .iter()
        .filter_map(|r| r.rpe)
        .collect();
    if rpes.len() >= recovery::RPE_MIN_SAMPLES {
        let mean = rpes.iter().mean();
        if mean >= recovery::HIGH_RPE {
            check.reasons.push(RecoveryReason::HighRpe { mean });
        }
    }

    if longest_done_streak(records) >= recovery::STREAK_DAYS {
        check.reasons.push(RecoveryReason::Streak {
            days: recovery::STREAK_DAYS,
        });
    }

    let recent = last_n(records, recovery::FAILURE_WINDOW);
    let missed = recent.iter().filter(|r| !r.is_done()).count();
    if missed >= recovery::FAILURE_THRESHOLD {
        check.reasons.push(RecoveryReason::MissedSessions {
            missed,
            of: recent.len(),
        });
    }

    check
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    InitialBalanced,
    MoreUpperBody { upper: usize, lower: usize },
    MoreLowerBody { upper: usize, lower: usize },
    OverusedExercise { exercise: String, count: usize },
    HighRecentRpe { mean: f64 },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Recommendation::InitialBalanced => {
                write!(f, "Starter pick: stretch, pushup and plank for a balanced routine.")
            }
            Recommendation::MoreUpperBody { upper, lower } => write!(
                f,
                "Upper body work is low ({} vs {} lower). Add pushups or pullups.",
                upper, lower
            ),
            Recommendation::MoreLowerBody { upper, lower } => write!(
                f,
                "Lower body work is low ({} vs {} upper). Add squats or lunges.",
                lower, upper
            ),
            Recommendation::OverusedExercise { exercise, count } => write!(
                f,
                "{} dominates your log ({} completions). Mix in a similar alternative.",
                exercise, count
            ),
            Recommendation::HighRecentRpe { mean } => write!(
                f,
                "Recent RPE averages {:.1}. Go light today: stretching or easy core work.",
                mean
            ),
        }
    }
}

pub fn recommend(records: &[ExerciseRecord], routines: &Routines) -> Vec<Recommendation> {
    let counts = records
        .iter()
        .filter(|r| r.is_done())
        .map(|r| r.exercise.as_str())
        .counts();
    if counts.is_empty() {
        return vec![Recommendation::InitialBalanced];
    }

    let mut recs = Vec::new();

    let volume_of = |kind: ExerciseType| -> usize {
        routines
            .iter()
            .filter(|(_, r)| r.kind == kind)
            .map(|(k, _)| counts.get(k.as_str()).copied().unwrap_or(0))
            .sum()
    };
    let upper = volume_of(ExerciseType::Upper);
    let lower = volume_of(ExerciseType::Lower);
    if (upper as f64) < lower as f64 * recommend::BALANCE_RATIO {
        recs.push(Recommendation::MoreUpperBody { upper, lower });
    }
    if (lower as f64) < upper as f64 * recommend::BALANCE_RATIO {
        recs.push(Recommendation::MoreLowerBody { upper, lower });
    }

    let mean_count = counts.values().map(|&c| c as f64).mean();
    let threshold = recommend::VARIETY_FLOOR.max((mean_count * recommend::VARIETY_MEAN_FACTOR) as usize);
    // Highest count wins; ties go to the alphabetically first exercise.
    if let Some((exercise, &count)) = counts
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .next()
        && count > threshold
    {
        recs.push(Recommendation::OverusedExercise {
            exercise: exercise.to_string(),
            count,
        });
    }

    let all_rpes: Vec<f64> = records.iter().filter_map(|r| r.rpe).collect();
    let recent = last_n(&all_rpes, recommend::RECENT_RPE_WINDOW);
    if !recent.is_empty() {
        let mean = recent.iter().mean();
        if mean >= recovery::HIGH_RPE {
            recs.push(Recommendation::HighRecentRpe { mean });
        }
    }

    recs
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayPerformance {
    pub weekday: Weekday,
    pub done: usize,
    pub total: usize,
}

impl WeekdayPerformance {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// Done-ratio per weekday that appears in the log, Monday first.
pub fn weekday_performance(records: &[ExerciseRecord]) -> Vec<WeekdayPerformance> {
    let mut by_day: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for r in records {
        let e = by_day
            .entry(r.date.weekday().num_days_from_monday() as usize)
            .or_default();
        e.1 += 1;
        if r.is_done() {
            e.0 += 1;
        }
    }
    by_day
        .into_iter()
        .map(|(idx, (done, total))| WeekdayPerformance {
            weekday: WEEK[idx],
            done,
            total,
        })
        .collect()
}

/// Completed sessions per weekday of the week containing `today`, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyProgress {
    pub monday: NaiveDate,
    pub done: [usize; 7],
}

impl WeeklyProgress {
    pub fn total(&self) -> usize {
        self.done.iter().sum()
    }
}

pub fn weekly_progress(records: &[ExerciseRecord], today: NaiveDate) -> WeeklyProgress {
    let monday = today.week(Weekday::Mon).first_day();
    let mut done = [0usize; 7];
    for r in records.iter().filter(|r| r.is_done()) {
        let offset = (r.date - monday).num_days();
        if (0..7).contains(&offset) {
            done[offset as usize] += 1;
        }
    }
    WeeklyProgress { monday, done }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleSuggestion {
    InsufficientData,
    LowAdherence { weekday: Weekday, ratio: f64 },
    BestHour { hour: u32, ratio: f64 },
    NoHourData,
}

impl fmt::Display for ScheduleSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScheduleSuggestion::InsufficientData => {
                write!(f, "Not enough data to optimise the schedule.")
            }
            ScheduleSuggestion::LowAdherence { weekday, ratio } => write!(
                f,
                "{} completion is low ({:.0}%). Ease the routine on that day.",
                weekday,
                ratio * 100.0
            ),
            ScheduleSuggestion::BestHour { hour, ratio } => write!(
                f,
                "Most effective time slot: {}:00 ({:.0}% done). Schedule routines there.",
                hour,
                ratio * 100.0
            ),
            ScheduleSuggestion::NoHourData => {
                write!(f, "No hour data recorded, so time-of-day optimisation is limited.")
            }
        }
    }
}

pub fn optimize_schedule(records: &[ExerciseRecord]) -> Vec<ScheduleSuggestion> {
    if records.is_empty() {
        return vec![ScheduleSuggestion::InsufficientData];
    }

    let mut out: Vec<ScheduleSuggestion> = weekday_performance(records)
        .into_iter()
        .filter(|p| p.ratio() < schedule::LOW_ADHERENCE)
        .map(|p| ScheduleSuggestion::LowAdherence {
            weekday: p.weekday,
            ratio: p.ratio(),
        })
        .collect();

    let mut by_hour: BTreeMap<u32, (usize, usize)> = BTreeMap::new();
    for r in records {
        if let Some(h) = r.hour {
            let e = by_hour.entry(h).or_default();
            e.1 += 1;
            if r.is_done() {
                e.0 += 1;
            }
        }
    }

    // Earliest hour wins ties.
    let best = by_hour
        .iter()
        .map(|(&h, &(done, total))| (h, done as f64 / total as f64))
        .fold(None, |best: Option<(u32, f64)>, (h, ratio)| match best {
            Some((_, b)) if b >= ratio => best,
            _ => Some((h, ratio)),
        });

    match best {
        Some((hour, ratio)) => out.push(ScheduleSuggestion::BestHour { hour, ratio }),
        None => out.push(ScheduleSuggestion::NoHourData),
    }
    out
}

// ---------------------------------------------------------------------------
// Monthly report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTrend {
    pub day: u32,
    pub avg_rpe: Option<f64>,
    pub adherence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub records: usize,
    /// Distinct dates with at least one completed exercise.
    pub active_days: usize,
    pub completed: usize,
    pub avg_rpe: Option<f64>,
    /// Completed / logged, in [0, 1].
    pub completion_rate: f64,
    /// Completions per exercise, most first.
    pub exercise_counts: Vec<(String, usize)>,
    pub daily: Vec<DailyTrend>,
}

pub fn monthly_report(records: &[ExerciseRecord], year: i32, month: u32) -> MonthlyReport {
    let month_recs: Vec<&ExerciseRecord> = records
        .iter()
        .filter(|r| r.date.year() == year && r.date.month() == month)
        .collect();
    let done: Vec<&&ExerciseRecord> = month_recs.iter().filter(|r| r.is_done()).collect();

    let active_days = done.iter().map(|r| r.date).unique().count();
    let rpes: Vec<f64> = month_recs.iter().filter_map(|r| r.rpe).collect();
    let avg_rpe = (!rpes.is_empty()).then(|| rpes.iter().mean());
    let completion_rate = if month_recs.is_empty() {
        0.0
    } else {
        done.len() as f64 / month_recs.len() as f64
    };

    let exercise_counts = done
        .iter()
        .map(|r| r.exercise.clone())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect();

    let daily = month_recs
        .iter()
        .into_group_map_by(|r| r.date.day())
        .into_iter()
        .sorted_by_key(|(day, _)| *day)
        .map(|(day, recs)| {
            let rpes: Vec<f64> = recs.iter().filter_map(|r| r.rpe).collect();
            let done = recs.iter().filter(|r| r.is_done()).count();
            DailyTrend {
                day,
                avg_rpe: (!rpes.is_empty()).then(|| rpes.iter().mean()),
                adherence: done as f64 / recs.len() as f64,
            }
        })
        .collect();

    MonthlyReport {
        year,
        month,
        records: month_recs.len(),
        active_days,
        completed: done.len(),
        avg_rpe,
        completion_rate,
        exercise_counts,
        daily,
    }
}

// ---------------------------------------------------------------------------
// Chart data
// ---------------------------------------------------------------------------

/// `(year, month)` keys render as `YYYY-MM`.
pub fn month_label(key: (i32, u32)) -> String {
    format!("{:04}-{:02}", key.0, key.1)
}

fn month_key(r: &ExerciseRecord) -> (i32, u32) {
    (r.date.year(), r.date.month())
}

/// Exercise x weekday done-ratio; unobserved cells are 0.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayHeatmap {
    pub exercises: Vec<String>,
    pub cells: Vec<[f64; 7]>,
}

pub fn weekday_heatmap(records: &[ExerciseRecord]) -> WeekdayHeatmap {
    let mut tallies: BTreeMap<&str, [(usize, usize); 7]> = BTreeMap::new();
    for r in records {
        let day = r.date.weekday().num_days_from_monday() as usize;
        let cell = &mut tallies.entry(r.exercise.as_str()).or_default()[day];
        cell.1 += 1;
        if r.is_done() {
            cell.0 += 1;
        }
    }
    let exercises = tallies.keys().map(|k| k.to_string()).collect();
    let cells = tallies
        .values()
        .map(|&row| {
            row.map(|(done, total)| {
                if total == 0 {
                    0.0
                } else {
                    done as f64 / total as f64
                }
            })
        })
        .collect();
    WeekdayHeatmap { exercises, cells }
}

/// Mean planned intensity per month.
pub fn monthly_intensity(records: &[ExerciseRecord]) -> Vec<((i32, u32), f64)> {
    records
        .iter()
        .into_group_map_by(|r| month_key(r))
        .into_iter()
        .sorted_by_key(|(k, _)| *k)
        .map(|(k, recs)| (k, recs.iter().map(|r| r.intensity as f64).mean()))
        .collect()
}

/// Done-ratio per month.
pub fn monthly_adherence(records: &[ExerciseRecord]) -> Vec<((i32, u32), f64)> {
    records
        .iter()
        .into_group_map_by(|r| month_key(r))
        .into_iter()
        .sorted_by_key(|(k, _)| *k)
        .map(|(k, recs)| {
            let done = recs.iter().filter(|r| r.is_done()).count();
            (k, done as f64 / recs.len() as f64)
        })
        .collect()
}

/// Completions per month, split by exercise. `counts[m][e]` pairs `months[m]` with `exercises[e]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyVolume {
    pub months: Vec<(i32, u32)>,
    pub exercises: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

pub fn monthly_volume(records: &[ExerciseRecord]) -> MonthlyVolume {
    let done: Vec<&ExerciseRecord> = records.iter().filter(|r| r.is_done()).collect();
    let months: Vec<(i32, u32)> = done.iter().map(|r| month_key(r)).unique().sorted().collect();
    let exercises: Vec<String> = done
        .iter()
        .map(|r| r.exercise.clone())
        .unique()
        .sorted()
        .collect();

    let mut counts = vec![vec![0usize; exercises.len()]; months.len()];
    for r in done {
        if let (Ok(m), Ok(e)) = (
            months.binary_search(&month_key(r)),
            exercises.binary_search(&r.exercise),
        ) {
            counts[m][e] += 1;
        }
    }
    MonthlyVolume {
        months,
        exercises,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(d: &str, ex: &str, done: bool, rpe: Option<f64>, hour: Option<u32>) -> ExerciseRecord {
        ExerciseRecord {
            date: date(d),
            exercise: ex.to_string(),
            target: 10,
            unit: "reps".to_string(),
            intensity: 2,
            done: done.into(),
            rpe,
            hour,
        }
    }

    fn routines() -> Routines {
        crate::data::default_routines()
    }

    #[test]
    fn today_routine_filters_by_weekday() {
        // 2024-01-01 is a Monday: squat and plank.
        let plan = routines();
        let today = today_routine(&plan, date("2024-01-01"));
        let keys: Vec<&str> = today.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["plank", "squat"]);
    }

    #[test]
    fn weekly_progress_counts_this_week_only() {
        let records = vec![
            rec("2024-05-05", "squat", true, None, None), // previous Sunday
            rec("2024-05-06", "squat", true, None, None),
            rec("2024-05-06", "plank", true, None, None),
            rec("2024-05-07", "pushup", false, None, None),
            rec("2024-05-08", "lunge", true, None, None),
            rec("2024-05-12", "stretch", true, None, None),
            rec("2024-05-13", "squat", true, None, None), // next Monday
        ];
        // Wednesday 2024-05-08
        let week = weekly_progress(&records, date("2024-05-08"));
        assert_eq!(week.monday, date("2024-05-06"));
        assert_eq!(week.done, [2, 0, 1, 0, 0, 0, 1]);
        assert_eq!(week.total(), 4);

        // A Sunday still belongs to the week that started the Monday before.
        let sunday = weekly_progress(&records, date("2024-05-12"));
        assert_eq!(sunday.monday, date("2024-05-06"));
        assert_eq!(weekly_progress(&[], date("2024-05-12")).total(), 0);
    }

    #[test]
    fn no_records_needs_no_recovery() {
        assert!(!need_recovery(&[]).needed());
    }

    #[test]
    fn high_rpe_triggers_recovery() {
        let records = vec![
            rec("2024-01-01", "squat", true, Some(9.0), None),
            rec("2024-01-03", "squat", true, Some(8.0), None),
            rec("2024-01-05", "squat", true, Some(8.5), None),
        ];
        let check = need_recovery(&records);
        assert!(check.needed());
        assert!(matches!(check.reasons[0], RecoveryReason::HighRpe { .. }));
    }

    #[test]
    fn streak_of_three_days_triggers_recovery() {
        let records = vec![
            rec("2024-01-01", "squat", true, None, None),
            rec("2024-01-02", "pushup", true, None, None),
            rec("2024-01-02", "plank", true, None, None),
            rec("2024-01-03", "lunge", true, None, None),
        ];
        assert_eq!(longest_done_streak(&records), 3);
        let check = need_recovery(&records);
        assert_eq!(check.reasons, vec![RecoveryReason::Streak { days: 3 }]);
    }

    #[test]
    fn gaps_break_the_streak() {
        let records = vec![
            rec("2024-01-01", "squat", true, None, None),
            rec("2024-01-02", "squat", true, None, None),
            rec("2024-01-03", "squat", false, None, None),
            rec("2024-01-04", "squat", true, None, None),
        ];
        assert_eq!(longest_done_streak(&records), 2);
    }

    #[test]
    fn missed_sessions_trigger_recovery() {
        let records = vec![
            rec("2024-01-01", "squat", true, None, None),
            rec("2024-01-03", "squat", false, None, None),
            rec("2024-01-05", "squat", false, None, None),
            rec("2024-01-07", "squat", false, None, None),
        ];
        let check = need_recovery(&records);
        assert_eq!(
            check.reasons,
            vec![RecoveryReason::MissedSessions { missed: 3, of: 4 }]
        );
    }

    #[test]
    fn empty_log_gets_initial_recommendation() {
        let records = vec![rec("2024-01-01", "squat", false, None, None)];
        assert_eq!(
            recommend(&records, &routines()),
            vec![Recommendation::InitialBalanced]
        );
    }

    #[test]
    fn lower_heavy_log_recommends_upper_and_flags_overuse() {
        let mut records: Vec<ExerciseRecord> = (1..=10)
            .map(|d| rec(&format!("2024-01-{:02}", d * 2), "squat", true, Some(5.0), None))
            .collect();
        records.push(rec("2024-01-23", "pushup", true, Some(5.0), None));
        records.push(rec("2024-01-25", "plank", true, None, None));
        records.push(rec("2024-01-27", "stretch", true, None, None));

        // Mean count is 13 / 4, so the overuse threshold is max(3, 6) = 6.
        let recs = recommend(&records, &routines());
        assert!(recs.contains(&Recommendation::MoreUpperBody { upper: 1, lower: 10 }));
        assert!(recs.contains(&Recommendation::OverusedExercise {
            exercise: "squat".into(),
            count: 10
        }));
        assert!(!recs.iter().any(|r| matches!(r, Recommendation::HighRecentRpe { .. })));
    }

    #[test]
    fn upper_heavy_log_recommends_lower() {
        let records = vec![
            rec("2024-01-02", "pushup", true, None, None),
            rec("2024-01-04", "pushup", true, None, None),
        ];
        let recs = recommend(&records, &routines());
        assert!(recs.contains(&Recommendation::MoreLowerBody { upper: 2, lower: 0 }));
    }

    #[test]
    fn recent_high_rpe_recommends_light_day() {
        let records = vec![
            rec("2024-01-01", "squat", true, Some(3.0), None),
            rec("2024-01-02", "pushup", true, Some(9.0), None),
            rec("2024-01-04", "lunge", true, Some(9.0), None),
            rec("2024-01-06", "pushup", true, Some(8.0), None),
            rec("2024-01-08", "squat", true, Some(8.0), None),
            rec("2024-01-10", "pushup", true, Some(9.0), None),
        ];
        let recs = recommend(&records, &routines());
        let high = recs
            .iter()
            .find_map(|r| match r {
                Recommendation::HighRecentRpe { mean } => Some(*mean),
                _ => None,
            })
            .unwrap();
        assert_relative_eq!(high, 8.6, epsilon = 1e-9);
    }

    #[test]
    fn weekday_ratios_are_in_unit_range() {
        let records = vec![
            rec("2024-01-01", "squat", true, None, None),
            rec("2024-01-01", "plank", false, None, None),
            rec("2024-01-08", "squat", true, None, None),
            rec("2024-01-03", "lunge", false, None, None),
        ];
        let perf = weekday_performance(&records);
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].weekday, Weekday::Mon);
        assert_relative_eq!(perf[0].ratio(), 2.0 / 3.0);
        assert_eq!(perf[1].weekday, Weekday::Wed);
        assert_relative_eq!(perf[1].ratio(), 0.0);
        assert!(perf.iter().all(|p| (0.0..=1.0).contains(&p.ratio())));
    }

    #[test]
    fn schedule_flags_low_days_and_best_hour() {
        assert_eq!(
            optimize_schedule(&[]),
            vec![ScheduleSuggestion::InsufficientData]
        );

        let records = vec![
            rec("2024-01-03", "squat", false, None, Some(21)),
            rec("2024-01-01", "squat", true, None, Some(7)),
            rec("2024-01-08", "squat", true, None, Some(7)),
        ];
        let out = optimize_schedule(&records);
        assert_eq!(
            out,
            vec![
                ScheduleSuggestion::LowAdherence {
                    weekday: Weekday::Wed,
                    ratio: 0.0
                },
                ScheduleSuggestion::BestHour {
                    hour: 7,
                    ratio: 1.0
                },
            ]
        );
    }

    #[test]
    fn schedule_notes_missing_hours() {
        let records = vec![rec("2024-01-01", "squat", true, None, None)];
        assert_eq!(
            optimize_schedule(&records),
            vec![ScheduleSuggestion::NoHourData]
        );
    }

    #[test]
    fn monthly_report_aggregates_one_month() {
        let records = vec![
            rec("2024-01-31", "squat", true, Some(6.0), None),
            rec("2024-02-01", "squat", true, Some(7.0), None),
            rec("2024-02-01", "pushup", true, None, None),
            rec("2024-02-03", "squat", true, Some(9.0), None),
            rec("2024-02-05", "lunge", false, None, None),
        ];
        let report = monthly_report(&records, 2024, 2);
        assert_eq!(report.records, 4);
        assert_eq!(report.active_days, 2);
        assert_eq!(report.completed, 3);
        assert_relative_eq!(report.avg_rpe.unwrap(), 8.0);
        assert_relative_eq!(report.completion_rate, 0.75);
        assert_eq!(
            report.exercise_counts,
            vec![("squat".to_string(), 2), ("pushup".to_string(), 1)]
        );
        assert_eq!(report.daily.len(), 3);
        assert_eq!(report.daily[0].day, 1);
        assert_relative_eq!(report.daily[2].adherence, 0.0);

        let empty = monthly_report(&records, 2023, 5);
        assert_eq!(empty.records, 0);
        assert_eq!(empty.avg_rpe, None);
        assert_eq!(empty.completion_rate, 0.0);
    }

    #[test]
    fn chart_series_group_by_month() {
        let records = vec![
            rec("2024-01-01", "squat", true, None, None),
            rec("2024-01-02", "pushup", false, None, None),
            rec("2024-02-01", "squat", true, None, None),
            rec("2024-02-02", "pushup", true, None, None),
        ];
        let adherence = monthly_adherence(&records);
        assert_eq!(adherence, vec![((2024, 1), 0.5), ((2024, 2), 1.0)]);
        assert_eq!(month_label(adherence[0].0), "2024-01");

        let volume = monthly_volume(&records);
        assert_eq!(volume.exercises, vec!["pushup", "squat"]);
        assert_eq!(volume.counts, vec![vec![0, 1], vec![1, 1]]);

        let heat = weekday_heatmap(&records);
        assert_eq!(heat.exercises, vec!["pushup", "squat"]);
        // squat: Monday 2024-01-01 done, Thursday 2024-02-01 done
        assert_eq!(heat.cells[1][0], 1.0);
        assert_eq!(heat.cells[1][3], 1.0);
        assert_eq!(heat.cells[0][1], 0.0);

        let intensity = monthly_intensity(&records);
        assert_relative_eq!(intensity[0].1, 2.0);
    }
}
