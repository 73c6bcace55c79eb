//! Weekday aggregates and the Greenshields speed-density fit over processed
//! VDS rows.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    config::constants::traffic::{DENSITY_MAX, WEEK_ORDER},
    data::VdsRecord,
    models::LinearRegression,
    utils::get_max,
};

/// Mean speed per weekday name, slowest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySpeedStats {
    pub by_day: Vec<(String, f64)>,
}

impl DailySpeedStats {
    pub fn slowest(&self) -> Option<&(String, f64)> {
        self.by_day.first()
    }

    pub fn fastest(&self) -> Option<&(String, f64)> {
        self.by_day.last()
    }
}

pub fn daily_speed_stats(records: &[VdsRecord]) -> DailySpeedStats {
    let by_day = records
        .iter()
        .filter_map(|r| Some((r.weekday.clone()?, r.speed?)))
        .into_group_map()
        .into_iter()
        .map(|(day, speeds)| (day, speeds.into_iter().mean()))
        .sorted_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
        .collect();
    DailySpeedStats { by_day }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyPoint {
    pub day: &'static str,
    pub mean_volume: Option<f64>,
    pub mean_speed: Option<f64>,
}

/// Monday..Sunday means; days without rows stay `None`.
pub fn weekly_pattern(records: &[VdsRecord]) -> Vec<WeeklyPoint> {
    let mean_of = |day: &str, pick: fn(&VdsRecord) -> Option<f64>| {
        let values: Vec<f64> = records
            .iter()
            .filter(|r| r.weekday.as_deref() == Some(day))
            .filter_map(pick)
            .collect();
        (!values.is_empty()).then(|| values.iter().mean())
    };

    WEEK_ORDER
        .iter()
        .map(|&day| WeeklyPoint {
            day,
            mean_volume: mean_of(day, |r| r.volume),
            mean_speed: mean_of(day, |r| r.speed),
        })
        .collect()
}

/// Density/speed pairs inside the fit range `0 < k < DENSITY_MAX`.
pub fn fit_points(records: &[VdsRecord]) -> Vec<(f64, f64)> {
    records
        .iter()
        .filter_map(|r| Some((r.density?, r.speed?)))
        .filter(|(k, _)| *k > 0.0 && *k < DENSITY_MAX)
        .collect()
}

/// `v = uf * (1 - k / kj)`, fitted as `v = slope * k + intercept`.
#[derive(Debug, Clone, PartialEq)]
pub struct GreenshieldsParams {
    pub slope: f64,
    pub intercept: f64,
    /// uf, km/h
    pub free_flow_speed: f64,
    /// kj, veh/km
    pub jam_density: f64,
    /// q_max, veh/h
    pub capacity: f64,
    pub n_points: usize,
    pub max_density: f64,
}

impl GreenshieldsParams {
    pub fn speed_at(&self, density: f64) -> f64 {
        self.slope * density + self.intercept
    }

    /// 100 evenly spaced points of the fitted line over `[0, max_density]`.
    pub fn line(&self) -> Vec<(f64, f64)> {
        let n = 100;
        (0..n)
            .map(|i| {
                let k = self.max_density * i as f64 / (n - 1) as f64;
                (k, self.speed_at(k))
            })
            .collect()
    }

    pub fn summary(&self) -> TrafficSummary {
        TrafficSummary {
            free_flow_speed: self.free_flow_speed,
            jam_density: self.jam_density,
            capacity: self.capacity,
        }
    }
}

pub fn fit_greenshields(records: &[VdsRecord]) -> Result<GreenshieldsParams> {
    let points = fit_points(records);
    if points.len() < 2 {
        bail!(
            "need at least 2 rows with 0 < density < {} for the fit, got {}",
            DENSITY_MAX,
            points.len()
        );
    }

    let x = Array2::from_shape_fn((points.len(), 1), |(i, _)| points[i].0);
    let y = Array1::from_iter(points.iter().map(|p| p.1));
    let mut model = LinearRegression::new();
    model
        .fit(&x, &y)
        .context("speed-density regression failed")?;

    let slope = model.coefficients.as_ref().map(|c| c[0]).unwrap_or_default();
    let intercept = model.intercept.unwrap_or_default();
    if slope.abs() < f64::EPSILON {
        bail!("speed does not change with density, jam density is undefined");
    }

    let free_flow_speed = intercept;
    let jam_density = -intercept / slope;
    let densities: Vec<f64> = points.iter().map(|p| p.0).collect();

    Ok(GreenshieldsParams {
        slope,
        intercept,
        free_flow_speed,
        jam_density,
        capacity: free_flow_speed * jam_density / 4.0,
        n_points: points.len(),
        max_density: get_max(&densities),
    })
}

/// The three numbers the route simulator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub free_flow_speed: f64,
    pub jam_density: f64,
    pub capacity: f64,
}

pub fn save_summary(path: &Path, summary: &TrafficSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))
}

pub fn load_summary(path: &Path) -> Result<TrafficSummary> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid summary in {}", path.display()))
}
