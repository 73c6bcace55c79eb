use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExerciseType {
    Upper,
    Lower,
    Core,
    Cardio,
    Mobility,
    /// Missing or unrecognised `type`; counts toward no body-balance group.
    #[default]
    #[serde(other)]
    Other,
}

/// A scheduled exercise. `days` holds English weekday abbreviations (`Mon`..`Sun`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub days: Vec<String>,
    pub reps: u32,
    pub intensity: u8,
    #[serde(rename = "type", default)]
    pub kind: ExerciseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Routine {
    pub fn is_scheduled_on(&self, weekday: Weekday) -> bool {
        let abbrev = weekday_abbrev(weekday);
        self.days.iter().any(|d| d == abbrev)
    }

    pub fn unit_or_default(&self) -> &str {
        self.unit.as_deref().unwrap_or("reps")
    }
}

/// Exercise key to routine.
pub type Routines = BTreeMap<String, Routine>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Done {
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
}

impl From<bool> for Done {
    fn from(done: bool) -> Self {
        if done { Done::Yes } else { Done::No }
    }
}

// Only an explicit Y counts as done; blanks and anything else read as N.
impl<'de> Deserialize<'de> for Done {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.trim().eq_ignore_ascii_case("y").into())
    }
}

/// One row of the records log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub date: NaiveDate,
    pub exercise: String,
    pub target: u32,
    pub unit: String,
    pub intensity: u8,
    pub done: Done,
    #[serde(rename = "RPE")]
    pub rpe: Option<f64>,
    pub hour: Option<u32>,
}

impl ExerciseRecord {
    pub fn is_done(&self) -> bool {
        self.done == Done::Yes
    }
}

pub fn weekday_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Accepts `Mon`, `mon` or `monday` and returns the stored abbreviation.
pub fn parse_day_abbrev(s: &str) -> Option<&'static str> {
    s.trim().parse::<Weekday>().ok().map(weekday_abbrev)
}

/// Key for a new routine: the lowercased name with whitespace as `_`,
/// suffixed with its creation time so repeated names stay distinct.
pub fn routine_key(name: &str, created_ms: i64) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}_{}", slug, created_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routine_json_uses_type_key() {
        let json = r#"{"days":["Mon","Thu"],"reps":60,"intensity":2,"type":"core","unit":"sec"}"#;
        let r: Routine = serde_json::from_str(json).unwrap();
        assert_eq!(r.kind, ExerciseType::Core);
        assert!(r.is_scheduled_on(Weekday::Thu));
        assert!(!r.is_scheduled_on(Weekday::Fri));
        assert_eq!(r.unit_or_default(), "sec");
        assert_eq!(r.kind.to_string(), "core");
    }

    #[test]
    fn day_names_normalise_to_abbreviations() {
        assert_eq!(parse_day_abbrev("mon"), Some("Mon"));
        assert_eq!(parse_day_abbrev(" Saturday "), Some("Sat"));
        assert_eq!(parse_day_abbrev("SUN"), Some("Sun"));
        assert_eq!(parse_day_abbrev("someday"), None);
    }

    #[test]
    fn routine_keys_slug_the_name() {
        assert_eq!(routine_key("Jump Rope", 1_700_000_000_000), "jump_rope_1700000000000");
        assert_eq!(routine_key("  Row ", 5), "row_5");
    }

    #[test]
    fn unknown_or_missing_type_reads_as_other() {
        let r: Routine =
            serde_json::from_str(r#"{"days":["Mon"],"reps":5,"intensity":1,"type":"fullbody"}"#)
                .unwrap();
        assert_eq!(r.kind, ExerciseType::Other);
        let r: Routine =
            serde_json::from_str(r#"{"days":["Mon"],"reps":5,"intensity":1}"#).unwrap();
        assert_eq!(r.kind, ExerciseType::Other);
    }

    #[test]
    fn only_y_counts_as_done() {
        let cases = [
            (r#""Y""#, Done::Yes),
            (r#""y""#, Done::Yes),
            (r#""N""#, Done::No),
            (r#""""#, Done::No),
            (r#""maybe""#, Done::No),
        ];
        for (raw, want) in cases {
            let done: Done = serde_json::from_str(raw).unwrap();
            assert_eq!(done, want, "{}", raw);
        }
        assert_eq!(serde_json::to_string(&Done::from(true)).unwrap(), r#""Y""#);
    }
}
