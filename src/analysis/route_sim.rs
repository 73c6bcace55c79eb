//! Two-route traffic assignment with the BPR link performance function.

use std::fmt;

use anyhow::{Result, bail};

use crate::{
    analysis::traffic::TrafficSummary,
    config::constants::route_sim::{
        BPR_ALPHA, BPR_BETA, DEFAULT_CAPACITY, DEFAULT_FREE_FLOW_SPEED,
        EQUILIBRIUM_TOLERANCE_MIN,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BprParams {
    /// km/h
    pub free_flow_speed: f64,
    /// veh/h for a capacity scale of 1
    pub capacity: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl Default for BprParams {
    fn default() -> Self {
        Self {
            free_flow_speed: DEFAULT_FREE_FLOW_SPEED,
            capacity: DEFAULT_CAPACITY,
            alpha: BPR_ALPHA,
            beta: BPR_BETA,
        }
    }
}

impl From<&TrafficSummary> for BprParams {
    fn from(s: &TrafficSummary) -> Self {
        Self {
            free_flow_speed: s.free_flow_speed,
            capacity: s.capacity,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub name: &'static str,
    pub distance_km: f64,
    pub capacity_scale: f64,
}

/// Short route through the middle junctions.
pub const ROUTE_A: Route = Route {
    name: "A",
    distance_km: 5.0,
    capacity_scale: 1.0,
};

/// Longer detour with 20% more capacity.
pub const ROUTE_B: Route = Route {
    name: "B",
    distance_km: 8.0,
    capacity_scale: 1.2,
};

/// Minutes to traverse `route` carrying `volume` veh/h.
pub fn travel_time(volume: f64, route: &Route, params: &BprParams) -> f64 {
    let t0 = route.distance_km / params.free_flow_speed * 60.0;
    let cap = params.capacity * route.capacity_scale;
    t0 * (1.0 + params.alpha * (volume / cap).powf(params.beta))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Equilibrium,
    AFaster(f64),
    BFaster(f64),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Equilibrium => write!(
                f,
                "Equilibrium: both routes take about the same time, no driver gains by switching"
            ),
            Verdict::AFaster(d) => write!(
                f,
                "Route A is {:.1} min faster, drivers will shift to it",
                d
            ),
            Verdict::BFaster(d) => write!(
                f,
                "Route B is {:.1} min faster, drivers will shift to it",
                d
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub split_a_pct: f64,
    pub volume_a: f64,
    pub volume_b: f64,
    pub time_a: f64,
    pub time_b: f64,
    /// Vehicle-minutes, rounded.
    pub total_system_time: f64,
    pub verdict: Verdict,
}

pub fn simulate(total_demand: f64, split_a_pct: f64, params: &BprParams) -> Result<SimulationResult> {
    if !(0.0..=100.0).contains(&split_a_pct) {
        bail!("split must be within 0..=100 percent, got {}", split_a_pct);
    }
    if total_demand < 0.0 || !total_demand.is_finite() {
        bail!("total demand must be a non-negative number, got {}", total_demand);
    }
    if params.free_flow_speed <= 0.0 || params.capacity <= 0.0 {
        bail!(
            "free-flow speed and capacity must be positive (uf {}, C {})",
            params.free_flow_speed,
            params.capacity
        );
    }

    let volume_a = total_demand * split_a_pct / 100.0;
    let volume_b = total_demand * (100.0 - split_a_pct) / 100.0;
    let time_a = travel_time(volume_a, &ROUTE_A, params);
    let time_b = travel_time(volume_b, &ROUTE_B, params);

    let diff = (time_a - time_b).abs();
    let verdict = if diff < EQUILIBRIUM_TOLERANCE_MIN {
        Verdict::Equilibrium
    } else if time_a < time_b {
        Verdict::AFaster(diff)
    } else {
        Verdict::BFaster(diff)
    };

    Ok(SimulationResult {
        split_a_pct,
        volume_a,
        volume_b,
        time_a,
        time_b,
        total_system_time: (volume_a * time_a + volume_b * time_b).round(),
        verdict,
    })
}

/// One result per whole-percent split, 0..=100.
pub fn sweep_splits(total_demand: f64, params: &BprParams) -> Result<Vec<SimulationResult>> {
    (0..=100)
        .map(|pct| simulate(total_demand, pct as f64, params))
        .collect()
}

/// Whole-percent split where the two travel times are closest (user equilibrium).
pub fn equilibrium_split(total_demand: f64, params: &BprParams) -> Result<SimulationResult> {
    best_by(total_demand, params, |r| (r.time_a - r.time_b).abs())
}

/// Whole-percent split with the lowest total system travel time.
pub fn system_optimum_split(total_demand: f64, params: &BprParams) -> Result<SimulationResult> {
    best_by(total_demand, params, |r| r.total_system_time)
}

fn best_by(
    total_demand: f64,
    params: &BprParams,
    key: impl Fn(&SimulationResult) -> f64,
) -> Result<SimulationResult> {
    sweep_splits(total_demand, params)?
        .into_iter()
        .min_by(|a, b| key(a).total_cmp(&key(b)))
        .ok_or_else(|| anyhow::anyhow!("empty split sweep"))
}
