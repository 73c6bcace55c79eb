use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail, ensure};
use chrono::{Datelike, NaiveDate, Weekday};

use crate::{
    analysis::exercise::{
        monthly_adherence, monthly_intensity, monthly_report, monthly_volume, need_recovery,
        optimize_schedule, recommend, today_routine, weekday_heatmap, weekly_progress,
    },
    config::{PERSISTENCE, constants::exercise::routine as routine_defaults},
    data::{append_record, load_records, load_routines, save_routines},
    domain::{
        ExerciseRecord, ExerciseType, Routine, routine_key, weekday_abbrev,
    },
    report::exercise::{
        draw_intensity_trend, draw_monthly_adherence, draw_stacked_volume, draw_weekday_heatmap,
        draw_weekly_progress, monthly_report_text, routine_table, routines_table,
        weekly_progress_line,
    },
    utils::now_timestamp_ms,
};

fn exercise_dir(base: &Path) -> PathBuf {
    base.join(PERSISTENCE.exercise.directory)
}

/// Today's plan, recovery check, recommendations, schedule advice and charts.
pub fn exercise_overview(base: &Path, date: NaiveDate, charts: bool) -> Result<()> {
    let dir = exercise_dir(base);
    let routines = load_routines(&dir.join(PERSISTENCE.exercise.routines_file))?;
    let records = load_records(&dir.join(PERSISTENCE.exercise.records_file))?;
    log::info!(
        "Loaded {} routines and {} records from {}",
        routines.len(),
        records.len(),
        dir.display()
    );

    println!(
        "=== Today's Routine ({} {}) ===",
        date,
        weekday_abbrev(date.weekday())
    );
    let today = today_routine(&routines, date);
    if today.is_empty() {
        println!("Rest day: nothing scheduled.");
    } else {
        println!("{}", routine_table(&today));
    }

    println!("\n=== Recovery Check ===");
    let recovery = need_recovery(&records);
    if recovery.needed() {
        for reason in &recovery.reasons {
            println!("- {}", reason);
        }
    } else {
        println!("Recovery need is low.");
    }

    println!("\n=== Recommendations ===");
    for rec in recommend(&records, &routines) {
        println!("- {}", rec);
    }

    println!("\n=== Schedule Suggestions ===");
    for s in optimize_schedule(&records) {
        println!("- {}", s);
    }

    println!("\n=== This Week ===");
    let week = weekly_progress(&records, date);
    println!("{}", weekly_progress_line(&week));

    if !charts {
        return Ok(());
    }
    if records.is_empty() {
        log::warn!("No records yet, charts skipped");
        return Ok(());
    }

    let cfg = &PERSISTENCE.exercise;
    draw_weekly_progress(&dir.join(cfg.weekly_chart), &week)?;
    draw_weekday_heatmap(&dir.join(cfg.heatmap_chart), &weekday_heatmap(&records))?;
    draw_intensity_trend(&dir.join(cfg.intensity_chart), &monthly_intensity(&records))?;
    let volume = monthly_volume(&records);
    if volume.months.is_empty() {
        log::warn!("No completed sessions yet, volume chart skipped");
    } else {
        draw_stacked_volume(&dir.join(cfg.volume_chart), &volume)?;
    }
    draw_monthly_adherence(&dir.join(cfg.adherence_chart), &monthly_adherence(&records))?;
    println!("\nCharts written to {}", dir.display());
    Ok(())
}

/// One session to append. Missing target/unit/intensity come from the routine.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub exercise: String,
    pub done: bool,
    pub rpe: Option<f64>,
    pub hour: Option<u32>,
    pub target: Option<u32>,
    pub unit: Option<String>,
    pub intensity: Option<u8>,
}

pub fn exercise_log(base: &Path, entry: LogEntry) -> Result<ExerciseRecord> {
    if let Some(rpe) = entry.rpe {
        ensure!((1.0..=10.0).contains(&rpe), "RPE must be within 1..=10, got {}", rpe);
    }
    if let Some(hour) = entry.hour {
        ensure!(hour < 24, "hour must be within 0..=23, got {}", hour);
    }

    let dir = exercise_dir(base);
    let routines = load_routines(&dir.join(PERSISTENCE.exercise.routines_file))?;
    let routine = routines.get(&entry.exercise);

    let target = entry
        .target
        .or(routine.map(|r| r.reps))
        .with_context(|| format!("'{}' has no routine, pass --target", entry.exercise))?;
    let unit = entry
        .unit
        .or_else(|| routine.map(|r| r.unit_or_default().to_string()))
        .unwrap_or_else(|| "reps".to_string());
    let intensity = entry
        .intensity
        .or(routine.map(|r| r.intensity))
        .with_context(|| format!("'{}' has no routine, pass --intensity", entry.exercise))?;

    let record = ExerciseRecord {
        date: entry.date,
        exercise: entry.exercise,
        target,
        unit,
        intensity,
        done: entry.done.into(),
        rpe: entry.rpe,
        hour: entry.hour,
    };
    append_record(&dir.join(PERSISTENCE.exercise.records_file), &record)?;
    println!(
        "Logged {} {} {} on {} ({})",
        record.exercise,
        record.target,
        record.unit,
        record.date,
        if record.is_done() { "done" } else { "missed" }
    );
    Ok(record)
}

pub fn exercise_report(base: &Path, year: i32, month: u32) -> Result<()> {
    ensure!((1..=12).contains(&month), "month must be within 1..=12, got {}", month);
    let records = load_records(&exercise_dir(base).join(PERSISTENCE.exercise.records_file))?;
    println!("{}", monthly_report_text(&monthly_report(&records, year, month)));
    Ok(())
}

fn routines_path(base: &Path) -> PathBuf {
    exercise_dir(base).join(PERSISTENCE.exercise.routines_file)
}

/// Normalise day names to `Mon`..`Sun`, Monday first, without repeats.
fn normalise_days(days: &[String]) -> Result<Vec<String>> {
    let mut parsed: Vec<Weekday> = Vec::with_capacity(days.len());
    for d in days {
        let day = d
            .trim()
            .parse::<Weekday>()
            .map_err(|_| anyhow!("unknown day '{}', use Mon..Sun", d))?;
        if !parsed.contains(&day) {
            parsed.push(day);
        }
    }
    parsed.sort_by_key(|w| w.num_days_from_monday());
    Ok(parsed
        .into_iter()
        .map(|w| weekday_abbrev(w).to_string())
        .collect())
}

/// A routine to add. Missing reps/unit/intensity take the configured defaults.
#[derive(Debug, Clone)]
pub struct NewRoutine {
    pub name: String,
    pub days: Vec<String>,
    pub reps: Option<u32>,
    pub unit: Option<String>,
    pub kind: ExerciseType,
    pub intensity: Option<u8>,
}

/// Store a new routine under a generated key and return the key.
pub fn routine_add(base: &Path, new: NewRoutine) -> Result<String> {
    let name = new.name.trim();
    ensure!(!name.is_empty(), "routine name must not be empty");
    let days = normalise_days(&new.days)?;
    ensure!(!days.is_empty(), "pick at least one day for '{}'", name);
    let intensity = new.intensity.unwrap_or(routine_defaults::DEFAULT_INTENSITY);
    ensure!(
        (1..=routine_defaults::MAX_INTENSITY).contains(&intensity),
        "intensity must be within 1..={}, got {}",
        routine_defaults::MAX_INTENSITY,
        intensity
    );

    let path = routines_path(base);
    let mut routines = load_routines(&path)?;
    let key = routine_key(name, now_timestamp_ms());
    ensure!(!routines.contains_key(&key), "routine '{}' already exists", key);
    routines.insert(
        key.clone(),
        Routine {
            name: Some(name.to_string()),
            days,
            reps: new.reps.unwrap_or(routine_defaults::DEFAULT_REPS),
            intensity,
            kind: new.kind,
            unit: Some(
                new.unit
                    .unwrap_or_else(|| routine_defaults::DEFAULT_UNIT.to_string()),
            ),
        },
    );
    save_routines(&path, &routines)?;
    println!("Added routine {}", key);
    Ok(key)
}

pub fn routine_remove(base: &Path, key: &str) -> Result<Routine> {
    let path = routines_path(base);
    let mut routines = load_routines(&path)?;
    let Some(removed) = routines.remove(key) else {
        bail!("no routine named '{}'", key);
    };
    save_routines(&path, &routines)?;
    println!("Removed routine {}", key);
    Ok(removed)
}

/// Replace the scheduled days of `key`. An empty list unschedules it.
pub fn routine_set_days(base: &Path, key: &str, days: &[String]) -> Result<Vec<String>> {
    let days = normalise_days(days)?;
    let path = routines_path(base);
    let mut routines = load_routines(&path)?;
    let routine = routines
        .get_mut(key)
        .with_context(|| format!("no routine named '{}'", key))?;
    routine.days = days.clone();
    save_routines(&path, &routines)?;
    if days.is_empty() {
        println!("{} is no longer scheduled", key);
    } else {
        println!("{} now runs on {}", key, days.join(" "));
    }
    Ok(days)
}

pub fn routine_list(base: &Path) -> Result<()> {
    let routines = load_routines(&routines_path(base))?;
    if routines.is_empty() {
        println!("No routines stored.");
    } else {
        println!("{}", routines_table(&routines));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(exercise: &str) -> LogEntry {
        LogEntry {
            date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            exercise: exercise.to_string(),
            done: true,
            rpe: Some(7.0),
            hour: Some(18),
            target: None,
            unit: None,
            intensity: None,
        }
    }

    #[test]
    fn log_fills_defaults_from_routine() {
        let dir = tempfile::tempdir().unwrap();
        let rec = exercise_log(dir.path(), entry("plank")).unwrap();
        assert_eq!(rec.target, 60);
        assert_eq!(rec.unit, "sec");
        assert_eq!(rec.intensity, 2);

        let stored = load_records(
            &exercise_dir(dir.path()).join(PERSISTENCE.exercise.records_file),
        )
        .unwrap();
        assert_eq!(stored, vec![rec]);
    }

    #[test]
    fn unknown_exercise_needs_explicit_target() {
        let dir = tempfile::tempdir().unwrap();
        assert!(exercise_log(dir.path(), entry("burpee")).is_err());

        let mut e = entry("burpee");
        e.target = Some(10);
        e.intensity = Some(4);
        let rec = exercise_log(dir.path(), e).unwrap();
        assert_eq!(rec.unit, "reps");
    }

    #[test]
    fn out_of_range_rpe_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut e = entry("squat");
        e.rpe = Some(11.0);
        assert!(exercise_log(dir.path(), e).is_err());
    }

    fn days(list: &[&str]) -> Vec<String> {
        list.iter().map(|d| d.to_string()).collect()
    }

    fn jump_rope() -> NewRoutine {
        NewRoutine {
            name: " Jump Rope ".to_string(),
            days: days(&["fri", "Tuesday", "Fri"]),
            reps: None,
            unit: Some("min".to_string()),
            kind: ExerciseType::Cardio,
            intensity: Some(4),
        }
    }

    #[test]
    fn added_routine_is_stored_with_generated_key() {
        let dir = tempfile::tempdir().unwrap();
        let key = routine_add(dir.path(), jump_rope()).unwrap();
        assert!(key.starts_with("jump_rope_"));

        let routines = load_routines(&routines_path(dir.path())).unwrap();
        assert_eq!(routines.len(), 6);
        let r = &routines[&key];
        assert_eq!(r.name.as_deref(), Some("Jump Rope"));
        assert_eq!(r.days, days(&["Tue", "Fri"]));
        assert_eq!(r.reps, routine_defaults::DEFAULT_REPS);
        assert_eq!(r.unit_or_default(), "min");
        assert_eq!(r.kind, ExerciseType::Cardio);
        assert_eq!(r.intensity, 4);
    }

    #[test]
    fn bad_routines_are_rejected_before_saving() {
        let dir = tempfile::tempdir().unwrap();
        let mut no_days = jump_rope();
        no_days.days.clear();
        assert!(routine_add(dir.path(), no_days).is_err());

        let mut bad_day = jump_rope();
        bad_day.days = days(&["Funday"]);
        assert!(routine_add(dir.path(), bad_day).is_err());

        let mut blank = jump_rope();
        blank.name = "  ".to_string();
        assert!(routine_add(dir.path(), blank).is_err());

        let mut too_hard = jump_rope();
        too_hard.intensity = Some(9);
        assert!(routine_add(dir.path(), too_hard).is_err());

        assert!(!routines_path(dir.path()).exists());
    }

    #[test]
    fn routines_can_be_rescheduled_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let set = routine_set_days(dir.path(), "squat", &days(&["sun", "mon"])).unwrap();
        assert_eq!(set, days(&["Mon", "Sun"]));

        let removed = routine_remove(dir.path(), "pushup").unwrap();
        assert_eq!(removed.kind, ExerciseType::Upper);
        assert!(routine_remove(dir.path(), "pushup").is_err());
        assert!(routine_set_days(dir.path(), "pushup", &days(&["Mon"])).is_err());

        let routines = load_routines(&routines_path(dir.path())).unwrap();
        assert_eq!(routines["squat"].days, days(&["Mon", "Sun"]));
        assert!(!routines.contains_key("pushup"));

        // Sunday 2024-05-12: squat now shows up, lunge (Wed/Sat) does not.
        let sunday = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let keys: Vec<&str> = today_routine(&routines, sunday)
            .iter()
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(keys, vec!["squat", "stretch"]);
    }

    #[test]
    fn overview_draws_every_chart_once_records_exist() {
        let dir = tempfile::tempdir().unwrap();
        exercise_log(dir.path(), entry("squat")).unwrap();
        let mut missed = entry("plank");
        missed.done = false;
        exercise_log(dir.path(), missed).unwrap();

        exercise_overview(dir.path(), NaiveDate::from_ymd_opt(2024, 5, 8).unwrap(), true)
            .unwrap();
        let cfg = &PERSISTENCE.exercise;
        for chart in [
            cfg.weekly_chart,
            cfg.heatmap_chart,
            cfg.intensity_chart,
            cfg.volume_chart,
            cfg.adherence_chart,
        ] {
            assert!(exercise_dir(dir.path()).join(chart).exists(), "{} missing", chart);
        }
    }

    #[test]
    fn overview_runs_on_an_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        exercise_overview(dir.path(), NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(), true)
            .unwrap();
        assert!(
            exercise_dir(dir.path())
                .join(PERSISTENCE.exercise.routines_file)
                .exists()
        );
    }
}
