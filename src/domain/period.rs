use std::str::FromStr;

use anyhow::{Context, Result, bail};

use crate::utils::TimeUtils;

/// A lookback span such as `90d`, `3mo` or `2y`, counted back from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Days(u32),
    Months(u32),
    Years(u32),
}

impl Period {
    /// Months count as 30 days and years as 365.
    pub fn as_days(&self) -> i64 {
        match *self {
            Period::Days(d) => d as i64,
            Period::Months(m) => m as i64 * 30,
            Period::Years(y) => y as i64 * 365,
        }
    }

    pub fn as_ms(&self) -> i64 {
        self.as_days() * TimeUtils::MS_IN_D
    }

    pub fn start_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.as_ms()
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .with_context(|| format!("period '{}' has no unit (expected d, mo or y)", s))?;
        let (num, unit) = s.split_at(split);
        let n: u32 = num
            .parse()
            .with_context(|| format!("period '{}' has no leading number", s))?;
        if n == 0 {
            bail!("period '{}' must be positive", s);
        }
        match unit {
            "d" => Ok(Period::Days(n)),
            "mo" => Ok(Period::Months(n)),
            "y" => Ok(Period::Years(n)),
            other => bail!("unknown period unit '{}' (expected d, mo or y)", other),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Period::Days(n) => write!(f, "{}d", n),
            Period::Months(n) => write!(f, "{}mo", n),
            Period::Years(n) => write!(f, "{}y", n),
        }
    }
}
