//! Routines JSON and the records CSV log.

use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::domain::{ExerciseRecord, ExerciseType, Routine, Routines};

fn routine(days: &[&str], reps: u32, intensity: u8, kind: ExerciseType) -> Routine {
    Routine {
        name: None,
        days: days.iter().map(|d| d.to_string()).collect(),
        reps,
        intensity,
        kind,
        unit: None,
    }
}

/// Sample plan written on first run.
pub fn default_routines() -> Routines {
    let mut plank = routine(&["Mon", "Thu"], 60, 2, ExerciseType::Core);
    plank.unit = Some("sec".to_string());

    Routines::from([
        (
            "squat".to_string(),
            routine(&["Mon", "Wed", "Fri"], 20, 3, ExerciseType::Lower),
        ),
        (
            "pushup".to_string(),
            routine(&["Tue", "Thu"], 15, 2, ExerciseType::Upper),
        ),
        ("plank".to_string(), plank),
        (
            "lunge".to_string(),
            routine(&["Wed", "Sat"], 12, 3, ExerciseType::Lower),
        ),
        (
            "stretch".to_string(),
            routine(&["Sun"], 10, 1, ExerciseType::Mobility),
        ),
    ])
}

/// Read the routines file, creating it from [`default_routines`] when absent.
pub fn load_routines(path: &Path) -> Result<Routines> {
    if !path.exists() {
        save_routines(path, &default_routines())?;
        log::info!("Created sample routines at {}", path.display());
    }

    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid routines in {}", path.display()))
}

/// Overwrite the routines file with `routines`.
pub fn save_routines(path: &Path, routines: &Routines) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(routines)?;
    fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))
}

/// All logged records in file order; an absent log is empty.
pub fn load_records(path: &Path) -> Result<Vec<ExerciseRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize().enumerate() {
        out.push(row.with_context(|| format!("bad record on line {} of {}", i + 2, path.display()))?);
    }
    Ok(out)
}

/// Append one record; the header is written only when the file is new.
pub fn append_record(path: &Path, record: &ExerciseRecord) -> Result<()> {
    let is_new = !path.exists();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Done;
    use chrono::NaiveDate;

    fn record(day: u32, done: Done, rpe: Option<f64>) -> ExerciseRecord {
        ExerciseRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            exercise: "squat".into(),
            target: 20,
            unit: "reps".into(),
            intensity: 3,
            done,
            rpe,
            hour: Some(7),
        }
    }

    #[test]
    fn routines_file_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercise_app/routines.json");

        let routines = load_routines(&path).unwrap();
        assert!(path.exists());
        assert_eq!(routines.len(), 5);
        assert_eq!(routines["plank"].unit_or_default(), "sec");

        fs::write(&path, r#"{"row":{"days":["Fri"],"reps":8,"intensity":2,"type":"upper"}}"#)
            .unwrap();
        let edited = load_routines(&path).unwrap();
        assert_eq!(edited.len(), 1);
        assert_eq!(edited["row"].kind, ExerciseType::Upper);
    }

    #[test]
    fn loose_routine_types_do_not_reject_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routines.json");
        fs::write(
            &path,
            r#"{
                "burpee": {"days":["Mon"],"reps":10,"intensity":4,"type":"fullbody"},
                "walk": {"days":["Sun"],"reps":30,"intensity":1,"unit":"min"},
                "squat": {"days":["Fri"],"reps":20,"intensity":3,"type":"lower"}
            }"#,
        )
        .unwrap();

        let routines = load_routines(&path).unwrap();
        assert_eq!(routines.len(), 3);
        assert_eq!(routines["burpee"].kind, ExerciseType::Other);
        assert_eq!(routines["walk"].kind, ExerciseType::Other);
        assert_eq!(routines["squat"].kind, ExerciseType::Lower);
    }

    #[test]
    fn saved_routines_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/routines.json");
        let mut routines = default_routines();
        routines.remove("lunge");
        save_routines(&path, &routines).unwrap();
        assert_eq!(load_routines(&path).unwrap(), routines);
    }

    #[test]
    fn blank_or_unknown_done_reads_as_not_done() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        fs::write(
            &path,
            "date,exercise,target,unit,intensity,done,RPE,hour\n\
             2024-03-01,squat,20,reps,3,,,\n\
             2024-03-02,squat,20,reps,3,y,6.0,8\n\
             2024-03-03,squat,20,reps,3,skipped,,\n",
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        let done: Vec<Done> = records.iter().map(|r| r.done).collect();
        assert_eq!(done, vec![Done::No, Done::Yes, Done::No]);
        assert_eq!(records[0].rpe, None);
        assert_eq!(records[1].hour, Some(8));
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_records(&dir.path().join("records.csv")).unwrap().is_empty());
    }

    #[test]
    fn append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");

        append_record(&path, &record(1, Done::Yes, Some(7.0))).unwrap();
        append_record(&path, &record(2, Done::No, None)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,exercise,target,unit,intensity,done,RPE,hour");
        assert_eq!(lines[1], "2024-03-01,squat,20,reps,3,Y,7.0,7");
        assert_eq!(lines[2], "2024-03-02,squat,20,reps,3,N,,7");

        let records = load_records(&path).unwrap();
        assert_eq!(records, vec![record(1, Done::Yes, Some(7.0)), record(2, Done::No, None)]);
    }
}
