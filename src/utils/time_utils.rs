use chrono::{DateTime, Utc};

pub type AppInstant = std::time::Instant;

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_MIN * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_MIN * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_MIN * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_4_H: i64 = Self::MS_IN_H * 4;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const MS_IN_W: i64 = Self::MS_IN_D * 7;
    pub const MS_IN_1_M: i64 = Self::MS_IN_D * 30;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";
    pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    /// Convert interval in milliseconds to a Binance-style shorthand (e.g. `30m`, `1h`).
    pub fn interval_to_string(interval_ms: i64) -> &'static str {
        match interval_ms {
            Self::MS_IN_MIN => "1m",
            Self::MS_IN_5_MIN => "5m",
            Self::MS_IN_15_MIN => "15m",
            Self::MS_IN_30_MIN => "30m",
            Self::MS_IN_H => "1h",
            Self::MS_IN_4_H => "4h",
            Self::MS_IN_D => "1d",
            Self::MS_IN_W => "1w",
            Self::MS_IN_1_M => "1M",
            _ => "unknown",
        }
    }

    /// Inverse of `interval_to_string`.
    pub fn interval_from_str(s: &str) -> Option<i64> {
        match s {
            "1m" => Some(Self::MS_IN_MIN),
            "5m" => Some(Self::MS_IN_5_MIN),
            "15m" => Some(Self::MS_IN_15_MIN),
            "30m" => Some(Self::MS_IN_30_MIN),
            "1h" => Some(Self::MS_IN_H),
            "4h" => Some(Self::MS_IN_4_H),
            "1d" => Some(Self::MS_IN_D),
            "1w" => Some(Self::MS_IN_W),
            "1M" => Some(Self::MS_IN_1_M),
            _ => None,
        }
    }
}

// Time Helper functions

fn format_epoch_ms(epoch_ms: i64, fmt: &str) -> String {
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(dt) => dt.format(fmt).to_string(),
        None => format!("<invalid ts {}>", epoch_ms),
    }
}

pub fn epoch_ms_to_date_string(epoch_ms: i64) -> String {
    format_epoch_ms(epoch_ms, TimeUtils::STANDARD_TIME_FORMAT)
}

pub fn epoch_ms_to_datetime_string(epoch_ms: i64) -> String {
    format_epoch_ms(epoch_ms, TimeUtils::DATETIME_FORMAT)
}

pub fn now_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }
    let months = days / 30;
    if months < 12 {
        return format!("{}M", months);
    }
    let years = months / 12;
    let rem_months = months % 12;
    format!("{}Y {}M", years, rem_months)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_strings_round_trip() {
        for ms in [TimeUtils::MS_IN_H, TimeUtils::MS_IN_D, TimeUtils::MS_IN_W] {
            let s = TimeUtils::interval_to_string(ms);
            assert_eq!(TimeUtils::interval_from_str(s), Some(ms));
        }
        assert_eq!(TimeUtils::interval_from_str("7h"), None);
    }

    #[test]
    fn formats_epoch_dates() {
        // 2024-01-02 03:04 UTC
        let ms = 1_704_164_640_000;
        assert_eq!(epoch_ms_to_date_string(ms), "2024-01-02");
        assert_eq!(epoch_ms_to_datetime_string(ms), "2024-01-02 03:04");
    }

    #[test]
    fn duration_buckets() {
        assert_eq!(format_duration(45_000), "45s");
        assert_eq!(format_duration(TimeUtils::MS_IN_D * 3), "3d");
        assert_eq!(format_duration(TimeUtils::MS_IN_D * 400), "1Y 1M");
    }
}
