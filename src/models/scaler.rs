use anyhow::{Result, bail, ensure};

use crate::utils::{get_max, get_min};

/// Span used for a column whose min equals its max; such a column maps to 0.
fn safe_range(min: f64, max: f64) -> f64 {
    let range = max - min;
    if range.abs() < f64::EPSILON { 1.0 } else { range }
}

/// Per-column min-max normalisation to [0, 1] for feature rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    mins: Vec<f64>,
    ranges: Vec<f64>,
}

impl MinMaxScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            bail!("cannot fit a scaler on zero rows");
        };
        let width = first.len();
        ensure!(width > 0, "cannot fit a scaler on zero-width rows");
        ensure!(
            rows.iter().all(|r| r.len() == width),
            "ragged rows: every row must have {} columns",
            width
        );

        let mut mins = Vec::with_capacity(width);
        let mut ranges = Vec::with_capacity(width);
        for col in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
            let (lo, hi) = (get_min(&column), get_max(&column));
            mins.push(lo);
            ranges.push(safe_range(lo, hi));
        }
        Ok(Self { mins, ranges })
    }

    pub fn n_features(&self) -> usize {
        self.mins.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.mins.iter().zip(&self.ranges))
            .map(|(x, (min, range))| (x - min) / range)
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn inverse_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.mins.iter().zip(&self.ranges))
            .map(|(x, (min, range))| x * range + min)
            .collect())
    }

    fn check_width(&self, row: &[f64]) -> Result<()> {
        ensure!(
            row.len() == self.n_features(),
            "row has {} columns, scaler was fitted on {}",
            row.len(),
            self.n_features()
        );
        Ok(())
    }
}

/// Min-max scaler for the single target column. Kept apart from `MinMaxScaler`
/// so predictions are never decoded with feature-space parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetScaler {
    min: f64,
    range: f64,
}

impl TargetScaler {
    pub fn fit(values: &[f64]) -> Result<Self> {
        ensure!(!values.is_empty(), "cannot fit a target scaler on zero values");
        let (lo, hi) = (get_min(values), get_max(values));
        Ok(Self {
            min: lo,
            range: safe_range(lo, hi),
        })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.range + self.min
    }
}
